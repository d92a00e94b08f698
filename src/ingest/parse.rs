use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// 依次尝试的日期格式（日/月优先）
pub const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y", "%m/%d/%Y"];

/// 低于该年份视为两位年份被误解析
const MIN_YEAR: i32 = 1900;

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // 整数部分允许空格分组（每组 3 位），之后是 . , ' 分隔的数字段
        Regex::new(r"[-\u{2212}]?\d+(?:[ \u{a0}\u{202f}]\d{3})*(?:[.,']\d+)*")
            .expect("static amount regex")
    })
}

fn day_first_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2,4})").expect("static date regex")
    })
}

fn year_first_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})[/\-.](\d{1,2})[/\-.](\d{1,2})").expect("static date regex")
    })
}

/// 从文本中提取金额
///
/// 支持 `49,90 €`、`€ 49.90`、`49,90 EUR`、`-1 234,56`、`1,234.50` 等写法。
/// 文本中有多个数字时优先取第一个带两位小数的，否则取第一个数字。
pub fn parse_amount(text: &str) -> Option<BigDecimal> {
    let mut first = None;
    for m in amount_regex().find_iter(text) {
        let Some((value, decimals)) = normalize_number(m.as_str()) else {
            continue;
        };
        if decimals == 2 {
            return Some(value);
        }
        if first.is_none() {
            first = Some(value);
        }
    }
    first
}

/// 规范化数字串，返回 (数值, 小数位数)
///
/// 最后一个分隔符后面是 1~2 位数字时作为小数点，其余分隔符一律视为千分位。
fn normalize_number(raw: &str) -> Option<(BigDecimal, usize)> {
    let (negative, body) = match raw.chars().next() {
        Some('-') | Some('\u{2212}') => (true, &raw[raw.chars().next()?.len_utf8()..]),
        _ => (false, raw),
    };

    let digits_and_seps: String = body
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();

    let last_sep = digits_and_seps.rfind(|c: char| matches!(c, '.' | ',' | '\''));
    let (int_part, frac_part) = match last_sep {
        Some(pos) => {
            let frac = &digits_and_seps[pos + 1..];
            if (1..=2).contains(&frac.len()) {
                (&digits_and_seps[..pos], frac)
            } else {
                (digits_and_seps.as_str(), "")
            }
        }
        None => (digits_and_seps.as_str(), ""),
    };

    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    if int_digits.is_empty() {
        return None;
    }

    let mut normalized = String::with_capacity(int_digits.len() + frac_part.len() + 2);
    if negative {
        normalized.push('-');
    }
    normalized.push_str(&int_digits);
    if !frac_part.is_empty() {
        normalized.push('.');
        normalized.push_str(frac_part);
    }

    BigDecimal::from_str(&normalized)
        .ok()
        .map(|v| (v, frac_part.len()))
}

/// 解析 JSON 数值金额（经十进制字符串转换，避免二进制浮点尾差）
pub fn amount_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// 解析日期：先按固定格式整体匹配，再从长文本中抽取 `DD/MM/YYYY` 或 `YYYY/MM/DD`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if date.year() >= MIN_YEAR {
                return Some(date);
            }
        }
    }

    if let Some(caps) = day_first_regex().captures(trimmed) {
        if caps[3].len() == 4 {
            let date = ymd(&caps[3], &caps[2], &caps[1]);
            if date.is_some() {
                return date;
            }
        }
    }

    if let Some(caps) = year_first_regex().captures(trimmed) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    (date.year() >= MIN_YEAR).then_some(date)
}
