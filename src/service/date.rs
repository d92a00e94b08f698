use chrono::NaiveDate;

/// 日期接近度评分；超出窗口返回 None（硬门槛）
///
/// 返回 (偏移天数, 子评分)。`W > 0` 时评分为 `1 - offset / (W + 1)`，
/// `W = 0` 时只接受同一天。
pub fn score(receipt: NaiveDate, transaction: NaiveDate, max_offset: u32) -> Option<(u32, f64)> {
    let offset = (receipt - transaction).num_days().unsigned_abs();
    if offset > u64::from(max_offset) {
        return None;
    }
    let offset = offset as u32;
    let value = if max_offset == 0 {
        1.0
    } else {
        1.0 - f64::from(offset) / (f64::from(max_offset) + 1.0)
    };
    Some((offset, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn same_day_scores_one() {
        assert_eq!(score(d("2024-03-01"), d("2024-03-01"), 3), Some((0, 1.0)));
    }

    #[test]
    fn offset_is_symmetric() {
        assert_eq!(score(d("2024-03-01"), d("2024-03-02"), 3), Some((1, 0.75)));
        assert_eq!(score(d("2024-03-02"), d("2024-03-01"), 3), Some((1, 0.75)));
    }

    #[test]
    fn window_edge_is_inclusive() {
        assert_eq!(score(d("2024-03-01"), d("2024-03-04"), 3), Some((3, 0.25)));
        assert_eq!(score(d("2024-03-01"), d("2024-03-05"), 3), None);
    }

    #[test]
    fn zero_window_only_accepts_same_day() {
        assert_eq!(score(d("2024-03-01"), d("2024-03-01"), 0), Some((0, 1.0)));
        assert_eq!(score(d("2024-03-01"), d("2024-03-02"), 0), None);
    }

    #[test]
    fn widest_window_does_not_overflow() {
        let (offset, value) = score(d("2024-03-01"), d("2024-03-04"), u32::MAX).unwrap();
        assert_eq!(offset, 3);
        assert!(value > 0.999 && value < 1.0, "score {value}");
    }

    #[test]
    fn crosses_month_boundary() {
        assert_eq!(score(d("2024-02-28"), d("2024-03-01"), 3).map(|s| s.0), Some(2));
    }
}
