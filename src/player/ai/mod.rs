pub mod basic;
pub mod config;
pub mod deepening;
pub mod engine;
pub mod eval;
pub mod horizon;
pub mod mcts;
pub mod minimax;
pub mod pvs;
pub mod strategy;
pub mod threat;
pub mod tt;

pub use config::{AIConfig, Algorithm, Layers};
pub use engine::{Engine, MoveResult};
pub use eval::ThreatEvaluator;
pub use strategy::{SearchContext, SearchOutcome, SearchState, SearchStrategy};
pub use threat::{Threat, ThreatWeights};
pub use tt::TranspositionCache;
