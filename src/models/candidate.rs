use serde::{Deserialize, Serialize};

/// 金额容差档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountTier {
    Strict,
    Loose,
    Reject,
}

impl std::fmt::Display for AmountTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "STRICT"),
            Self::Loose => write!(f, "LOOSE"),
            Self::Reject => write!(f, "REJECT"),
        }
    }
}

/// 三个维度的子评分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub amount: f64,
    pub date: f64,
    pub name: f64,
}

/// 通过全部硬门槛的 (收据, 交易) 候选对
///
/// `receipt_idx` / `transaction_idx` 是本次运行输入切片中的下标。
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub receipt_idx: usize,
    pub transaction_idx: usize,
    pub tier: AmountTier,
    pub relative_diff: f64,
    pub date_offset: u32,
    pub scores: SubScores,
    pub confidence: f64,
}
