//! 探索戦略の共通部分
//!
//! すべての戦略は `SearchStrategy::select_move` を実装する。探索は必ず
//! `SearchState` (盤面と候補生成器の複製) の上で行い、対局中の盤面には触れない。

use super::eval::ThreatEvaluator;
use super::tt::TranspositionCache;
use crate::core::{Board, Move, PlayerId, Position};
use crate::error::MoveError;
use crate::logic::candidates::CandidateGenerator;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 探索窓の端。符号反転してもあふれない値。
pub const INF: i32 = i32::MAX / 2;

/// 探索用の局面 (盤面 + 候補手)
#[derive(Clone)]
pub struct SearchState {
    pub board: Board,
    pub candidates: CandidateGenerator,
}

impl SearchState {
    pub fn new(board: Board) -> Self {
        let candidates = CandidateGenerator::from_board(&board);
        SearchState { board, candidates }
    }

    pub fn place(&mut self, pos: Position, player: PlayerId) -> Result<(), MoveError> {
        self.board.place(pos, player)?;
        self.candidates.place(&self.board, pos);
        Ok(())
    }

    pub fn undo(&mut self, pos: Position) -> Result<PlayerId, MoveError> {
        let player = self.board.undo(pos)?;
        self.candidates.undo();
        Ok(player)
    }
}

/// 探索の締め切り
///
/// 期限切れを検出すると取り消し済みとなり、以後は常に期限切れを返す。
pub struct Deadline {
    start: Instant,
    budget: Option<Duration>,
    stop: Option<Arc<AtomicBool>>,
    cancelled: Cell<bool>,
}

impl Deadline {
    pub fn unbounded() -> Self {
        Deadline {
            start: Instant::now(),
            budget: None,
            stop: None,
            cancelled: Cell::new(false),
        }
    }

    pub fn new(start: Instant, budget: Option<Duration>) -> Self {
        Deadline {
            start,
            budget,
            stop: None,
            cancelled: Cell::new(false),
        }
    }

    /// 外部から停止を要求できるようにする
    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn expired(&self) -> bool {
        if self.cancelled.get() {
            return true;
        }
        let over_budget = self
            .budget
            .is_some_and(|budget| self.start.elapsed() >= budget);
        let stopped = self
            .stop
            .as_ref()
            .is_some_and(|s| s.load(Ordering::Relaxed));
        if over_budget || stopped {
            self.cancelled.set(true);
        }
        self.cancelled.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// 探索中に共有する道具一式
pub struct SearchContext {
    pub evaluator: Arc<ThreatEvaluator>,
    pub cache: Arc<TranspositionCache>,
    pub deadline: Deadline,
    pub breadth: usize,
    pub randomized: bool,
    nodes: Cell<u64>,
    rng: RefCell<StdRng>,
}

impl SearchContext {
    pub fn new(
        evaluator: Arc<ThreatEvaluator>,
        cache: Arc<TranspositionCache>,
        deadline: Deadline,
        breadth: usize,
        seed: u64,
    ) -> Self {
        SearchContext {
            evaluator,
            cache,
            deadline,
            breadth: breadth.max(1),
            randomized: false,
            nodes: Cell::new(0),
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn randomized(mut self, randomized: bool) -> Self {
        self.randomized = randomized;
        self
    }

    #[inline]
    pub fn win_threshold(&self) -> i32 {
        self.evaluator.win_threshold()
    }

    #[inline]
    pub fn count_node(&self) {
        self.nodes.set(self.nodes.get() + 1);
    }

    pub fn nodes(&self) -> u64 {
        self.nodes.get()
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.deadline.expired()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.deadline.is_cancelled()
    }

    pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        f(&mut self.rng.borrow_mut())
    }

    /// `player` から見た盤面評価 (置換表経由)
    pub fn heuristic(&self, board: &Board, player: PlayerId) -> i32 {
        if let Some(v) = self.cache.get_heuristic(board, player) {
            return v;
        }
        let v = self.evaluator.heuristic(board, player);
        self.cache.store_heuristic(board, player, v);
        v
    }

    /// 探索順に並べた上位 `breadth` 手 (置換表経由)
    pub fn ordered_moves(&self, state: &SearchState, player: PlayerId) -> Vec<Move> {
        if let Some(moves) = self.cache.get_ranked(&state.board, player) {
            return moves;
        }
        let moves = state.candidates.ranked_moves_zero_sum(
            &state.board,
            &self.evaluator,
            player,
            self.breadth,
        );
        self.cache.store_ranked(&state.board, player, moves.clone());
        moves
    }

    /// 同点の手から1つ選ぶ。`randomized` でなければ先頭。
    pub fn pick(&self, ties: &[Move]) -> Option<Move> {
        if self.randomized {
            self.with_rng(|rng| ties.choose(rng).copied())
        } else {
            ties.first().copied()
        }
    }

    /// 置けば即5連になる手
    pub fn immediate_win(&self, state: &SearchState, player: PlayerId) -> Option<Move> {
        let win = self.win_threshold();
        state
            .candidates
            .active_cells()
            .map(|pos| Move::new(pos, self.evaluator.evaluate(&state.board, pos, player)))
            .find(|m| m.score >= win)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    pub best: Option<Move>,
    /// 読み切った深さ (一手読みの戦略は 1)
    pub depth: usize,
    pub cancelled: bool,
    pub nodes: u64,
}

pub trait SearchStrategy: Send {
    fn name(&self) -> &'static str;

    fn select_move(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> SearchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EqualityMode;
    use crate::logic::zobrist::ZobristTable;
    use crate::player::ai::threat::ThreatWeights;

    fn context(deadline: Deadline) -> SearchContext {
        SearchContext::new(
            Arc::new(ThreatEvaluator::new(ThreatWeights::default())),
            Arc::new(TranspositionCache::new(EqualityMode::Probabilistic, 1024)),
            deadline,
            4,
            7,
        )
    }

    #[test]
    fn test_state_place_undo_restores_hash() {
        let board = Board::with_table(Arc::new(ZobristTable::with_seed(9, 1)));
        let mut state = SearchState::new(board);
        let before = state.board.hash();
        state.place(Position::new(4, 4), PlayerId::Player1).unwrap();
        state.place(Position::new(4, 5), PlayerId::Player2).unwrap();
        assert!(state.place(Position::new(4, 5), PlayerId::Player1).is_err());
        state.undo(Position::new(4, 5)).unwrap();
        state.undo(Position::new(4, 4)).unwrap();
        assert_eq!(state.board.hash(), before);
        assert_eq!(state.candidates.active_count(), 0);
    }

    #[test]
    fn test_deadline() {
        assert!(!Deadline::unbounded().expired());
        let d = Deadline::new(Instant::now(), Some(Duration::ZERO));
        assert!(d.expired());
        assert!(d.is_cancelled());

        let stop = Arc::new(AtomicBool::new(false));
        let d = Deadline::unbounded().with_stop(stop.clone());
        assert!(!d.expired());
        stop.store(true, Ordering::Relaxed);
        assert!(d.expired());
    }

    #[test]
    fn test_ordered_moves_are_cached() {
        let ctx = context(Deadline::unbounded());
        let mut board = Board::with_table(Arc::new(ZobristTable::with_seed(15, 1)));
        board.place(Position::new(7, 7), PlayerId::Player1).unwrap();
        let state = SearchState::new(board);
        let first = ctx.ordered_moves(&state, PlayerId::Player2);
        assert_eq!(first.len(), 4);
        assert_eq!(ctx.cache.stats().rankings, 1);
        assert_eq!(ctx.ordered_moves(&state, PlayerId::Player2), first);
    }

    #[test]
    fn test_pick_without_randomization_is_first() {
        let ctx = context(Deadline::unbounded());
        let ties = [
            Move::new(Position::new(1, 1), 5),
            Move::new(Position::new(2, 2), 5),
        ];
        assert_eq!(ctx.pick(&ties), Some(ties[0]));
        let ctx = ctx.randomized(true);
        assert!(ties.contains(&ctx.pick(&ties).unwrap()));
        assert_eq!(ctx.pick(&[]), None);
    }
}
