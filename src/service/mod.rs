pub mod amount;
pub mod assigner;
pub mod candidates;
pub mod classifier;
pub mod date;
pub mod engine;
pub mod matcher;
pub mod scoring;
pub mod similarity;

pub use candidates::CandidateGenerator;
pub use engine::{EngineOutput, MatchEngine};
pub use matcher::MatcherService;
pub use scoring::ConfidenceAggregator;
pub use similarity::NameSimilarity;
