use crate::models::AmountTier;
use bigdecimal::{BigDecimal, ToPrimitive, Zero};

/// 金额比较结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountComparison {
    pub tier: AmountTier,
    /// |r - t| / max(|r|, |t|)
    pub relative_diff: f64,
}

impl AmountComparison {
    /// 金额子评分：STRICT = 1.0，LOOSE 档内从 1.0 线性降到 0.5，REJECT 无分
    pub fn score(&self, tier1: f64, tier2: f64) -> Option<f64> {
        match self.tier {
            AmountTier::Strict => Some(1.0),
            AmountTier::Loose => {
                let position = ((self.relative_diff - tier1) / (tier2 - tier1)).clamp(0.0, 1.0);
                Some(1.0 - 0.5 * position)
            }
            AmountTier::Reject => None,
        }
    }
}

/// 相对差值（十进制计算，两者都为 0 时为 0）
pub fn relative_difference(receipt: &BigDecimal, transaction: &BigDecimal) -> f64 {
    let diff = (receipt - transaction).abs();
    if diff.is_zero() {
        return 0.0;
    }
    let r = receipt.abs();
    let t = transaction.abs();
    let denom = if r > t { r } else { t };
    // diff 非零时 denom 必然非零；经十进制字符串转换，边界值（如 0.05）不产生尾差
    let ratio = diff / denom;
    ratio
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| ratio.to_f64())
        .unwrap_or(f64::INFINITY)
}

/// 按容差档位分类
pub fn compare(receipt: &BigDecimal, transaction: &BigDecimal, tier1: f64, tier2: f64) -> AmountComparison {
    let relative_diff = relative_difference(receipt, transaction);
    let tier = if relative_diff <= tier1 {
        AmountTier::Strict
    } else if relative_diff <= tier2 {
        AmountTier::Loose
    } else {
        AmountTier::Reject
    };
    AmountComparison { tier, relative_diff }
}
