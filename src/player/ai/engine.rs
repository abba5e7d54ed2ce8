//! 思考エンジン
//!
//! 設定に従って戦略を選び、盤面の複製の上で探索して着手を返す。
//! 置換表はエンジンごとに1つ持ち、対局の終了・再開時に消去する。

use super::basic::{basic_move, BasicStrategy, ZeroSumStrategy};
use super::config::{AIConfig, Algorithm};
use super::deepening::DeepeningScheduler;
use super::eval::ThreatEvaluator;
use super::horizon::ForcingExtension;
use super::mcts::MctsStrategy;
use super::minimax::MinimaxStrategy;
use super::pvs::PvsStrategy;
use super::strategy::{Deadline, SearchContext, SearchState, SearchStrategy};
use super::threat::ThreatWeights;
use super::tt::TranspositionCache;
use crate::core::{Board, Move, PlayerId};
use crate::error::ConfigError;
use crossbeam::channel::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 非同期の着手要求の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResult {
    pub player: PlayerId,
    pub best: Option<Move>,
    /// 採用した結果の深さ (0 は探索を経ない手)
    pub depth: usize,
    pub elapsed: Duration,
}

#[derive(Clone)]
pub struct Engine {
    config: AIConfig,
    evaluator: Arc<ThreatEvaluator>,
    cache: Arc<TranspositionCache>,
    seed: Option<u64>,
}

impl Engine {
    pub fn new(config: AIConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let evaluator = Arc::new(ThreatEvaluator::new(config.weights.clone()));
        let cache = Arc::new(TranspositionCache::new(config.equality, config.cache_capacity));
        Ok(Engine {
            config,
            evaluator,
            cache,
            seed: None,
        })
    }

    /// 乱数の種を固定する (テスト・再現用)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &AIConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &Arc<ThreatEvaluator> {
        &self.evaluator
    }

    pub fn cache(&self) -> &Arc<TranspositionCache> {
        &self.cache
    }

    /// 重みを差し替える。探索中には呼ばないこと (対局の合間に使う)。
    pub fn set_weights(&mut self, weights: ThreatWeights) -> Result<(), ConfigError> {
        weights.validate()?;
        self.evaluator = Arc::new(ThreatEvaluator::new(weights.clone()));
        self.config.weights = weights;
        self.cache.clear();
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// 着手を求める (呼び出し側をブロックする)
    pub fn request_move(&self, board: &Board, player: PlayerId) -> Option<Move> {
        self.search(board, player).best
    }

    /// 別スレッドで探索し、結果をチャネルで返す
    pub fn request_move_async(&self, board: Board, player: PlayerId) -> Receiver<MoveResult> {
        let (tx, rx) = channel::bounded(1);
        let engine = self.clone();
        std::thread::spawn(move || {
            let _ = tx.send(engine.search(&board, player));
        });
        rx
    }

    fn seed_for(&self, salt: u64) -> u64 {
        match self.seed {
            Some(seed) => seed.wrapping_add(salt),
            None => rand::random(),
        }
    }

    fn context(&self, deadline: Deadline, salt: u64) -> SearchContext {
        SearchContext::new(
            Arc::clone(&self.evaluator),
            Arc::clone(&self.cache),
            deadline,
            self.config.breadth,
            self.seed_for(salt),
        )
        .randomized(self.config.randomized_selection)
    }

    fn strategy(&self, depth: usize) -> Box<dyn SearchStrategy> {
        let c = &self.config;
        match c.algorithm {
            Algorithm::Heuristic => Box::new(BasicStrategy),
            Algorithm::ZeroSum => Box::new(ZeroSumStrategy),
            Algorithm::Minimax => Box::new(MinimaxStrategy::new(depth)),
            Algorithm::NegaScout => Box::new(PvsStrategy::new(depth)),
            Algorithm::ZeroMaxHybrid => Box::new(MinimaxStrategy::with_horizon(
                depth,
                Box::new(ForcingExtension::new(
                    c.rollout_probability,
                    c.extension_depth,
                    c.extension_node_budget,
                )),
            )),
            Algorithm::MonteCarlo => Box::new(MctsStrategy::new(
                c.mcts_iterations,
                c.exploration,
                c.sim_depth,
            )),
        }
    }

    /// 着手を求め、採用した深さなどの情報も返す
    pub fn search(&self, board: &Board, player: PlayerId) -> MoveResult {
        let start = Instant::now();
        let result = |best: Option<Move>, depth: usize| MoveResult {
            player,
            best,
            depth,
            elapsed: start.elapsed(),
        };

        if board.winner().is_some() || board.is_full() {
            return result(None, 0);
        }
        if board.is_board_empty() {
            return result(Some(Move::new(board.center(), 0)), 0);
        }

        let mut state = SearchState::new(board.clone());
        let budget = self.config.time_limit();
        let algorithm = self.config.algorithm;

        let (best, depth) = if algorithm.is_depth_based() && self.config.iterative_deepening {
            let scheduler =
                DeepeningScheduler::new(self.config.layers.depths(self.config.depth), budget);
            scheduler
                .run(
                    &state,
                    player,
                    |deadline, depth| self.context(deadline, depth as u64),
                    |depth| self.strategy(depth),
                )
                .map_or((None, 0), |r| (Some(r.best), r.depth))
        } else {
            // 一手読みの戦略は時間制限なし
            let deadline = match algorithm {
                Algorithm::Heuristic | Algorithm::ZeroSum => Deadline::unbounded(),
                _ => Deadline::new(start, Some(budget)),
            };
            let ctx = self.context(deadline, 0);
            let mut strategy = self.strategy(self.config.depth);
            let outcome = strategy.select_move(&mut state, player, &ctx);
            if outcome.cancelled {
                log::debug!("{} stopped at the time limit", strategy.name());
            }
            (outcome.best, outcome.depth)
        };

        // 探索が手を返さなければ貪欲法で
        let (best, depth) = match best {
            Some(mv) if board.is_empty_at(mv.pos) => (Some(mv), depth),
            _ => {
                log::warn!("{:?}: search returned no move, falling back to greedy", algorithm);
                (basic_move(&state, &self.evaluator, player), 0)
            }
        };

        if let Some(mv) = best {
            log::info!(
                "{:?} plays {} (depth {}, {:?})",
                player,
                mv,
                depth,
                start.elapsed()
            );
        }
        result(best, depth)
    }
}
