pub mod handlers;

pub use handlers::{default_config, health_check, match_receipts, MatchRequest, MatchResponse, StatementInput};

use crate::service::MatcherService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// 共享状态：按服务默认配置构造的对账服务
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MatcherService>,
}

impl AppState {
    pub fn new(service: MatcherService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/config", get(default_config))
        .route("/api/match", post(match_receipts))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
