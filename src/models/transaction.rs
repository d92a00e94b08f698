use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 交易标识 = 银行流水表中的行号（从 0 开始），导入时分配一次，全程不变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub usize);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}", self.0)
    }
}

/// 已表格化的银行流水：列名 + 字符串单元格
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl StatementTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 调用方指定的列映射
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub amount_column: String,
    pub date_column: String,
    pub description_column: String,
    /// 取金额绝对值（流水把支出记为负数时使用）
    #[serde(default)]
    pub absolute_amounts: bool,
}

impl ColumnMapping {
    pub fn new(
        amount_column: impl Into<String>,
        date_column: impl Into<String>,
        description_column: impl Into<String>,
    ) -> Self {
        Self {
            amount_column: amount_column.into(),
            date_column: date_column.into(),
            description_column: description_column.into(),
            absolute_amounts: false,
        }
    }
}

/// 校验后的交易
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: BigDecimal,
    pub date: NaiveDate,
    pub description: String,
}

impl Transaction {
    pub fn new(
        row: usize,
        amount: BigDecimal,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: TransactionId(row),
            amount,
            date,
            description: description.into(),
        }
    }
}
