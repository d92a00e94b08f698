use crate::api::AppState;
use crate::config::MatchingConfig;
use crate::error::MatchError;
use crate::ingest::read_statement_csv;
use crate::models::{ColumnMapping, MatchReport, RawReceipt, StatementTable};
use crate::service::MatcherService;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// 流水：已表格化的行，或原始 CSV 文本
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StatementInput {
    Table(StatementTable),
    Csv {
        csv: String,
        #[serde(default)]
        delimiter: Option<char>,
    },
}

impl StatementInput {
    fn into_table(self) -> Result<StatementTable, MatchError> {
        match self {
            Self::Table(table) => Ok(table),
            Self::Csv { csv, delimiter } => {
                let delimiter = match delimiter {
                    Some(c) if c.is_ascii() => Some(c as u8),
                    Some(c) => {
                        return Err(MatchError::Configuration(format!(
                            "delimiter '{c}' is not an ASCII character"
                        )))
                    }
                    None => None,
                };
                read_statement_csv(&csv, delimiter)
            }
        }
    }
}

/// 请求体
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub receipts: Vec<RawReceipt>,
    pub statement: StatementInput,
    pub mapping: ColumnMapping,
    /// 覆盖服务默认匹配参数
    #[serde(default)]
    pub config: Option<MatchingConfig>,
}

/// 响应体
#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MatchReport>,
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 对账接口
pub async fn match_receipts(State(state): State<AppState>, Json(req): Json<MatchRequest>) -> Response {
    let receipts = req.receipts.len();
    // 匹配是 CPU 密集计算，放到阻塞线程池
    let outcome = tokio::task::spawn_blocking(move || run(&state, req)).await;

    match outcome {
        Ok(Ok(report)) => {
            let message = format!(
                "Matched {} of {} receipts",
                report.stats.matched, report.stats.receipts
            );
            let response = MatchResponse {
                success: true,
                message,
                report: Some(report),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(e)) => {
            let status = if e.is_caller_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            tracing::warn!("对账失败 ({} 张收据): {}", receipts, e);
            error_response(status, e.to_string())
        }
        Err(e) => {
            tracing::error!("匹配任务异常退出: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn run(state: &AppState, req: MatchRequest) -> Result<MatchReport, MatchError> {
    let table = req.statement.into_table()?;
    match req.config {
        Some(config) => MatcherService::new(config)?.reconcile(&req.receipts, &table, &req.mapping),
        None => state.service.reconcile(&req.receipts, &table, &req.mapping),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let response = MatchResponse {
        success: false,
        message: format!("Error: {}", message),
        report: None,
    };
    (status, Json(response)).into_response()
}

/// 服务默认匹配参数
pub async fn default_config(State(state): State<AppState>) -> Json<MatchingConfig> {
    Json(state.service.engine().config().clone())
}
