//! 反復深化のスケジューラ
//!
//! 深さごとに1スレッドを立て、それぞれ複製した局面で探索する。取り消されずに
//! 読み切った結果のうち最も深いものを採用する (到着順には依存しない)。
//! 時間切れでも最も浅い深さの結果だけは待つ。

use super::strategy::{Deadline, SearchContext, SearchOutcome, SearchState, SearchStrategy};
use crate::core::{Move, PlayerId};
use crossbeam::channel::{self, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthResult {
    pub depth: usize,
    pub best: Move,
    pub nodes: u64,
}

pub struct DeepeningScheduler {
    depths: Vec<usize>,
    budget: Duration,
}

impl DeepeningScheduler {
    pub fn new(mut depths: Vec<usize>, budget: Duration) -> Self {
        depths.sort_unstable();
        depths.dedup();
        DeepeningScheduler { depths, budget }
    }

    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    /// `make_context` は締め切りから各スレッドの探索文脈を、`make_strategy` は
    /// 深さから戦略を作る。どちらもワーカースレッド上で呼ばれる。
    pub fn run<C, S>(
        &self,
        state: &SearchState,
        player: PlayerId,
        make_context: C,
        make_strategy: S,
    ) -> Option<DepthResult>
    where
        C: Fn(Deadline, usize) -> SearchContext + Sync,
        S: Fn(usize) -> Box<dyn SearchStrategy> + Sync,
    {
        let floor = *self.depths.first()?;
        let start = Instant::now();
        let resolve_at = start + self.budget;
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = channel::unbounded::<(usize, SearchOutcome)>();

        std::thread::scope(|scope| {
            for &depth in &self.depths {
                let tx = tx.clone();
                let stop = Arc::clone(&stop);
                let mut local = state.clone();
                let make_context = &make_context;
                let make_strategy = &make_strategy;
                scope.spawn(move || {
                    let budget = if depth == floor { None } else { Some(self.budget) };
                    let deadline = Deadline::new(start, budget).with_stop(stop);
                    let ctx = make_context(deadline, depth);
                    let mut strategy = make_strategy(depth);
                    let outcome = strategy.select_move(&mut local, player, &ctx);
                    // 受け手が先に終わっていれば結果は捨てる
                    let _ = tx.send((depth, outcome));
                });
            }
            drop(tx);

            let mut adopted: Option<DepthResult> = None;
            loop {
                let received = if adopted.is_some() {
                    rx.recv_deadline(resolve_at)
                } else {
                    rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
                };
                match received {
                    Ok((depth, outcome)) => {
                        let Some(best) = outcome.best else {
                            log::debug!("depth {} produced no move", depth);
                            continue;
                        };
                        if outcome.cancelled {
                            log::debug!("depth {} cancelled after {} nodes", depth, outcome.nodes);
                            continue;
                        }
                        log::debug!(
                            "depth {} completed: {} ({} nodes, {:?})",
                            depth,
                            best,
                            outcome.nodes,
                            start.elapsed()
                        );
                        if adopted.map_or(true, |a| depth > a.depth) {
                            adopted = Some(DepthResult {
                                depth,
                                best,
                                nodes: outcome.nodes,
                            });
                        }
                    }
                    Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            // 残りのワーカーを止めてから合流する
            stop.store(true, Ordering::Relaxed);
            adopted
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Board, EqualityMode, Position};
    use crate::logic::zobrist::ZobristTable;
    use crate::player::ai::eval::ThreatEvaluator;
    use crate::player::ai::minimax::MinimaxStrategy;
    use crate::player::ai::threat::ThreatWeights;
    use crate::player::ai::tt::TranspositionCache;

    fn state() -> SearchState {
        let mut board = Board::with_table(Arc::new(ZobristTable::with_seed(9, 12)));
        board.place(Position::new(4, 4), PlayerId::Player1).unwrap();
        board.place(Position::new(5, 4), PlayerId::Player2).unwrap();
        board.place(Position::new(4, 5), PlayerId::Player1).unwrap();
        SearchState::new(board)
    }

    fn run(budget: Duration) -> Option<DepthResult> {
        let evaluator = Arc::new(ThreatEvaluator::new(ThreatWeights::default()));
        let cache = Arc::new(TranspositionCache::new(EqualityMode::Probabilistic, 1 << 16));
        let scheduler = DeepeningScheduler::new(vec![3, 1, 2], budget);
        scheduler.run(
            &state(),
            PlayerId::Player2,
            |deadline, depth| {
                SearchContext::new(evaluator.clone(), cache.clone(), deadline, 5, depth as u64)
            },
            |depth| -> Box<dyn SearchStrategy> { Box::new(MinimaxStrategy::new(depth)) },
        )
    }

    #[test]
    fn test_depths_sorted() {
        let s = DeepeningScheduler::new(vec![4, 2, 2, 1], Duration::ZERO);
        assert_eq!(s.depths(), &[1, 2, 4]);
    }

    #[test]
    fn test_generous_budget_adopts_deepest() {
        let result = run(Duration::from_secs(60)).unwrap();
        assert_eq!(result.depth, 3);
    }

    #[test]
    fn test_zero_budget_still_returns_floor() {
        let result = run(Duration::ZERO).unwrap();
        assert_eq!(result.depth, 1);
    }

    // 深いほど早く終わる探索
    struct InvertedDelay {
        depth: usize,
        finished: Arc<parking_lot::Mutex<Vec<usize>>>,
    }

    impl SearchStrategy for InvertedDelay {
        fn name(&self) -> &'static str {
            "inverted"
        }

        fn select_move(
            &mut self,
            _state: &mut SearchState,
            _player: PlayerId,
            ctx: &SearchContext,
        ) -> SearchOutcome {
            std::thread::sleep(Duration::from_millis(60 * (4 - self.depth) as u64));
            self.finished.lock().push(self.depth);
            SearchOutcome {
                best: Some(Move::new(Position::new(self.depth, 0), 0)),
                depth: self.depth,
                cancelled: false,
                nodes: ctx.nodes(),
            }
        }
    }

    #[test]
    fn test_deepest_wins_regardless_of_arrival() {
        let evaluator = Arc::new(ThreatEvaluator::new(ThreatWeights::default()));
        let cache = Arc::new(TranspositionCache::new(EqualityMode::Probabilistic, 16));
        let finished = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let scheduler = DeepeningScheduler::new(vec![1, 2, 3], Duration::from_secs(30));
        let result = scheduler
            .run(
                &state(),
                PlayerId::Player1,
                |deadline, _| SearchContext::new(evaluator.clone(), cache.clone(), deadline, 5, 0),
                |depth| -> Box<dyn SearchStrategy> {
                    Box::new(InvertedDelay {
                        depth,
                        finished: finished.clone(),
                    })
                },
            )
            .unwrap();
        assert_eq!(*finished.lock(), vec![3, 2, 1]);
        assert_eq!(result.depth, 3);
        assert_eq!(result.best.pos, Position::new(3, 0));
    }

    #[test]
    fn test_empty_depths() {
        let scheduler = DeepeningScheduler::new(Vec::new(), Duration::ZERO);
        let evaluator = Arc::new(ThreatEvaluator::new(ThreatWeights::default()));
        let cache = Arc::new(TranspositionCache::new(EqualityMode::Probabilistic, 16));
        let result = scheduler.run(
            &state(),
            PlayerId::Player1,
            |deadline, _| SearchContext::new(evaluator.clone(), cache.clone(), deadline, 5, 0),
            |depth| -> Box<dyn SearchStrategy> { Box::new(MinimaxStrategy::new(depth)) },
        );
        assert!(result.is_none());
    }
}
