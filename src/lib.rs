pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod models;
pub mod service;

pub use config::{AppConfig, AssignmentPolicy, MatchingConfig, ScoreWeights};
pub use error::{MatchError, RecordDiagnostic, RecordError};
pub use service::{MatchEngine, MatcherService};
