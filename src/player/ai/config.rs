use super::threat::ThreatWeights;
use crate::core::EqualityMode;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH: &str = "ai_config.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    /// 一手読みの貪欲法 (攻め/守りの良い方)
    Heuristic,
    ZeroSum,
    #[default]
    Minimax,
    NegaScout,
    MonteCarlo,
    /// Minimax + 末端での強制手延長
    ZeroMaxHybrid,
}

impl Algorithm {
    /// 深さ指定の木探索か (反復深化の対象)
    pub fn is_depth_based(self) -> bool {
        matches!(
            self,
            Algorithm::Minimax | Algorithm::NegaScout | Algorithm::ZeroMaxHybrid
        )
    }
}

/// 反復深化で使う深さの絞り込み
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layers {
    #[default]
    All,
    Evens,
    Odds,
}

impl Layers {
    pub fn depths(self, max_depth: usize) -> Vec<usize> {
        (1..=max_depth)
            .filter(|d| match self {
                Layers::All => true,
                Layers::Evens => d % 2 == 0,
                Layers::Odds => d % 2 == 1,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AIConfig {
    pub algorithm: Algorithm,
    pub randomized_selection: bool,
    pub iterative_deepening: bool,
    pub time_limit_seconds: f64,
    pub depth: usize,
    pub breadth: usize,
    pub layers: Layers,
    /// 末端で延長探索を行う確率 (%)
    pub rollout_probability: u8,
    pub sim_depth: usize,
    pub weights: ThreatWeights,
    pub mcts_iterations: usize,
    pub exploration: f64,
    pub extension_depth: usize,
    pub extension_node_budget: usize,
    pub equality: EqualityMode,
    pub cache_capacity: usize,
}

impl Default for AIConfig {
    fn default() -> Self {
        AIConfig {
            algorithm: Algorithm::Minimax,
            randomized_selection: false,
            iterative_deepening: true,
            time_limit_seconds: 2.0,
            depth: 4,
            breadth: 10,
            layers: Layers::All,
            rollout_probability: 50,
            sim_depth: 8,
            weights: ThreatWeights::default(),
            mcts_iterations: 20_000,
            exploration: std::f64::consts::SQRT_2,
            extension_depth: 6,
            extension_node_budget: 2_000,
            equality: EqualityMode::Probabilistic,
            cache_capacity: 1 << 18,
        }
    }
}

impl AIConfig {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: AIConfig = serde_json::from_str(&config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("{} を読み込めません ({})。既定値を使います", CONFIG_PATH, e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::InvalidConfiguration {
                message: message.to_string(),
            })
        };
        if self.depth == 0 {
            return invalid("depth must be at least 1");
        }
        if self.breadth == 0 {
            return invalid("breadth must be at least 1");
        }
        if self.rollout_probability > 100 {
            return invalid("rolloutProbability must be within 0..=100");
        }
        if !self.time_limit_seconds.is_finite() || self.time_limit_seconds < 0.0 {
            return invalid("timeLimitSeconds must be a finite non-negative number");
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return invalid("exploration must be a finite non-negative number");
        }
        if self.cache_capacity == 0 {
            return invalid("cacheCapacity must be at least 1");
        }
        if self.algorithm.is_depth_based() && self.layers.depths(self.depth).is_empty() {
            return invalid("layers leaves no depth to search");
        }
        self.weights.validate()
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_seconds.max(0.0))
    }
}
