use crate::config::ScoreWeights;
use crate::models::SubScores;

/// 三项子评分加权求和得到置信度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceAggregator {
    weights: ScoreWeights,
}

impl ConfidenceAggregator {
    /// 权重须已通过 `MatchingConfig::validate`
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn aggregate(&self, scores: &SubScores) -> f64 {
        let w = &self.weights;
        (w.amount * scores.amount + w.date * scores.date + w.name * scores.name).clamp(0.0, 1.0)
    }
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}
