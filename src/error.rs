use serde::Serialize;
use thiserror::Error;

/// 致命错误：配置错误 / 不变量被破坏 / IO，出现即中止整次匹配，不产出部分结果
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("column mapping: {field} is not set")]
    MissingMapping { field: &'static str },

    #[error("column mapping: {field} names unknown column '{column}'")]
    UnknownColumn { field: &'static str, column: String },

    #[error("engine invariant violated: {0}")]
    InvariantViolation(String),

    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatchError {
    /// 调用方输入问题（配置、列映射、输入格式）而非引擎内部故障
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MissingMapping { .. }
                | Self::UnknownColumn { .. }
                | Self::Csv(_)
                | Self::Json(_)
        )
    }
}

/// 单条记录的可恢复错误，只排除该记录，不影响整批
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    #[error("missing field '{field}'")]
    MissingField { field: String },

    #[error("cannot parse amount '{value}'")]
    InvalidAmount { value: String },

    #[error("cannot parse date '{value}'")]
    InvalidDate { value: String },

    #[error("row has {found} cells, expected {expected}")]
    RowWidth { expected: usize, found: usize },

    #[error("duplicate receipt id '{id}'")]
    DuplicateId { id: String },
}

/// 诊断来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Receipt,
    Transaction,
}

/// 一次运行的诊断条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDiagnostic {
    pub source: RecordSource,
    pub record_id: String,
    pub error: RecordError,
}

impl RecordDiagnostic {
    pub fn receipt(record_id: impl Into<String>, error: RecordError) -> Self {
        Self {
            source: RecordSource::Receipt,
            record_id: record_id.into(),
            error,
        }
    }

    pub fn transaction(record_id: impl Into<String>, error: RecordError) -> Self {
        Self {
            source: RecordSource::Transaction,
            record_id: record_id.into(),
            error,
        }
    }
}

impl std::fmt::Display for RecordDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match self.source {
            RecordSource::Receipt => "receipt",
            RecordSource::Transaction => "transaction",
        };
        write!(f, "{source} '{}': {}", self.record_id, self.error)
    }
}
