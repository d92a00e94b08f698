use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 识别服务输出的原始收据（字段未校验）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReceipt {
    /// 来源文件名，作为收据的稳定标识
    #[serde(default, alias = "id")]
    pub filename: Option<String>,
    #[serde(default, alias = "vendor_name")]
    pub vendor: Option<String>,
    #[serde(default, alias = "total_amount", alias = "amount")]
    pub total: Option<RawAmount>,
    #[serde(default)]
    pub date: Option<String>,
}

/// 金额既可能是数字也可能是带货币符号的文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for RawAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// 校验后的收据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub vendor: String,
    pub total: BigDecimal,
    pub date: NaiveDate,
}

impl Receipt {
    pub fn new(
        id: impl Into<String>,
        vendor: impl Into<String>,
        total: BigDecimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            vendor: vendor.into(),
            total,
            date,
        }
    }
}
