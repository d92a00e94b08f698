use crate::error::MatchError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 匹配参数，构造引擎前校验，运行期间只读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// 最大日期偏移（天，含边界）
    pub days_delta: u32,
    pub amount_tolerance_tier1: f64,
    pub amount_tolerance_tier2: f64,
    pub similarity_threshold: f64,
    pub weights: ScoreWeights,
    pub assignment: AssignmentPolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            days_delta: 3,
            amount_tolerance_tier1: 0.05,
            amount_tolerance_tier2: 0.10,
            similarity_threshold: 0.85,
            weights: ScoreWeights::default(),
            assignment: AssignmentPolicy::default(),
        }
    }
}

/// 置信度权重，三者之和必须为 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub amount: f64,
    pub date: f64,
    pub name: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            amount: 0.4,
            date: 0.3,
            name: 0.3,
        }
    }
}

/// 一对一分配策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// 置信度从高到低贪心选取
    #[default]
    Greedy,
    /// 二分图最大权匹配（匈牙利算法）
    Optimal,
}

impl std::fmt::Display for AssignmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Greedy => write!(f, "greedy"),
            Self::Optimal => write!(f, "optimal"),
        }
    }
}

const WEIGHT_SUM_EPSILON: f64 = 1e-9;

impl MatchingConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        let t1 = self.amount_tolerance_tier1;
        let t2 = self.amount_tolerance_tier2;

        // NaN 会让所有比较为 false，统一挡在这里
        if !t1.is_finite() || !t2.is_finite() || !self.similarity_threshold.is_finite() {
            return Err(MatchError::Configuration(
                "tolerances and threshold must be finite numbers".into(),
            ));
        }
        if t1 < 0.0 || t1 >= t2 {
            return Err(MatchError::Configuration(format!(
                "amount_tolerance_tier1 must be in [0, tier2), got tier1={t1}, tier2={t2}"
            )));
        }
        if t2 > 1.0 {
            return Err(MatchError::Configuration(format!(
                "amount_tolerance_tier2 must be in (tier1, 1], got {t2}"
            )));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(MatchError::Configuration(format!(
                "similarity_threshold must be in [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        let w = &self.weights;
        for (name, value) in [("amount", w.amount), ("date", w.date), ("name", w.name)] {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchError::Configuration(format!(
                    "weight '{name}' must be a non-negative number, got {value}"
                )));
            }
        }
        let sum = w.amount + w.date + w.name;
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(MatchError::Configuration(format!(
                "weights must sum to 1, got {sum}"
            )));
        }

        Ok(())
    }
}

impl AppConfig {
    /// 从 matcher.toml（可选）和环境变量加载配置
    ///
    /// 环境变量前缀 `MATCHER_`，层级分隔 `__`，例如
    /// `MATCHER_SERVER__PORT=9000`、`MATCHER_MATCHING__DAYS_DELTA=5`。
    pub fn from_env() -> Result<Self, MatchError> {
        Self::load(None)
    }

    /// 指定配置文件（必须存在），环境变量仍然覆盖文件中的值
    pub fn from_file(path: &Path) -> Result<Self, MatchError> {
        Self::load(Some(path))
    }

    fn load(path: Option<&Path>) -> Result<Self, MatchError> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name("matcher").required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("MATCHER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = settings.try_deserialize()?;
        app.matching.validate()?;
        Ok(app)
    }
}
