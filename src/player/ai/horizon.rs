//! 地平線効果への対策
//!
//! Minimax の末端 (深さ0) で `HorizonPolicy::beyond_horizon` が呼ばれる。
//! 既定の `AcceptHeuristic` は静的評価をそのまま返す。`ForcingExtension` は
//! 一定の確率で、強制手 (四以上、または活三2方向) だけを使った小さな探索を
//! 追加で行い、その先の勝ち負けを読む。

use super::strategy::{SearchContext, SearchState};
use crate::core::{Position, PlayerId};
use rand::Rng;

pub trait HorizonPolicy: Send {
    /// `score` は `root` から見た末端の静的評価。`to_move` は次の手番。
    fn beyond_horizon(
        &mut self,
        score: i32,
        state: &mut SearchState,
        to_move: PlayerId,
        root: PlayerId,
        ctx: &SearchContext,
    ) -> i32;
}

pub struct AcceptHeuristic;

impl HorizonPolicy for AcceptHeuristic {
    fn beyond_horizon(
        &mut self,
        score: i32,
        _state: &mut SearchState,
        _to_move: PlayerId,
        _root: PlayerId,
        _ctx: &SearchContext,
    ) -> i32 {
        score
    }
}

pub struct ForcingExtension {
    /// 延長探索を行う確率 (%)
    probability: u8,
    max_depth: usize,
    node_budget: usize,
    nodes: usize,
}

impl ForcingExtension {
    pub fn new(probability: u8, max_depth: usize, node_budget: usize) -> Self {
        ForcingExtension {
            probability: probability.min(100),
            max_depth,
            node_budget,
            nodes: 0,
        }
    }

    /// `to_move` から見た値。予算を使い切ったら `None`。
    fn extend(
        &mut self,
        state: &mut SearchState,
        depth: usize,
        to_move: PlayerId,
        ctx: &SearchContext,
    ) -> Option<i32> {
        self.nodes += 1;
        if self.nodes > self.node_budget {
            return None;
        }
        let win = ctx.win_threshold();
        let h = ctx.heuristic(&state.board, to_move);
        if h.abs() >= win || depth == 0 || ctx.expired() {
            return Some(h);
        }
        if ctx.immediate_win(state, to_move).is_some() {
            return Some(win);
        }

        let opponent = to_move.opponent();
        let ordered = ctx.ordered_moves(state, to_move);
        // 相手の5連の芽は必ず止める
        let must_block: Vec<Position> = ordered
            .iter()
            .map(|m| m.pos)
            .filter(|&p| ctx.evaluator.evaluate(&state.board, p, opponent) >= win)
            .collect();
        let forced = !must_block.is_empty();
        let moves: Vec<Position> = if forced {
            must_block
        } else {
            ordered
                .iter()
                .map(|m| m.pos)
                .filter(|&p| ctx.evaluator.is_forcing(&state.board, p, to_move))
                .collect()
        };

        // 強制されていなければ何もしない選択 (静的評価) も取れる
        let mut best = if forced { -win } else { h };
        for pos in moves {
            if state.place(pos, to_move).is_err() {
                continue;
            }
            let reply = self.extend(state, depth - 1, opponent, ctx);
            let _ = state.undo(pos);
            best = best.max(-reply?);
        }
        Some(best)
    }
}

impl HorizonPolicy for ForcingExtension {
    fn beyond_horizon(
        &mut self,
        score: i32,
        state: &mut SearchState,
        to_move: PlayerId,
        root: PlayerId,
        ctx: &SearchContext,
    ) -> i32 {
        if self.probability == 0 || self.max_depth == 0 {
            return score;
        }
        let roll: u8 = ctx.with_rng(|rng| rng.gen_range(0..100));
        if roll >= self.probability {
            return score;
        }
        self.nodes = 0;
        match self.extend(state, self.max_depth, to_move, ctx) {
            Some(v) if to_move == root => v,
            Some(v) => -v,
            None => {
                log::trace!("forcing extension budget exhausted");
                score
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Board, EqualityMode};
    use crate::logic::zobrist::ZobristTable;
    use crate::player::ai::eval::ThreatEvaluator;
    use crate::player::ai::strategy::Deadline;
    use crate::player::ai::threat::ThreatWeights;
    use crate::player::ai::tt::TranspositionCache;
    use std::sync::Arc;

    fn context() -> SearchContext {
        SearchContext::new(
            Arc::new(ThreatEvaluator::new(ThreatWeights::default())),
            Arc::new(TranspositionCache::new(EqualityMode::Probabilistic, 4096)),
            Deadline::unbounded(),
            12,
            9,
        )
    }

    fn state_with(stones: &[(usize, usize, PlayerId)]) -> SearchState {
        let mut board = Board::with_table(Arc::new(ZobristTable::with_seed(15, 8)));
        for &(x, y, p) in stones {
            board.place(Position::new(x, y), p).unwrap();
        }
        SearchState::new(board)
    }

    #[test]
    fn test_accept_heuristic_is_identity() {
        let ctx = context();
        let mut state = state_with(&[(7, 7, PlayerId::Player1)]);
        let v = AcceptHeuristic.beyond_horizon(123, &mut state, PlayerId::Player2, PlayerId::Player1, &ctx);
        assert_eq!(v, 123);
    }

    #[test]
    fn test_extension_sees_open_four_win() {
        // 黒の活三: 黒番なら活四 → 5連で勝ちが読める
        let stones = [
            (6, 7, PlayerId::Player1),
            (7, 7, PlayerId::Player1),
            (8, 7, PlayerId::Player1),
            (0, 0, PlayerId::Player2),
            (14, 14, PlayerId::Player2),
        ];
        let ctx = context();
        let mut state = state_with(&stones);
        let hash = state.board.hash();
        let mut policy = ForcingExtension::new(100, 4, 10_000);
        let v = policy.beyond_horizon(0, &mut state, PlayerId::Player1, PlayerId::Player1, &ctx);
        assert_eq!(v, ctx.win_threshold());
        // 白から見れば負け
        let v = policy.beyond_horizon(0, &mut state, PlayerId::Player1, PlayerId::Player2, &ctx);
        assert_eq!(v, -ctx.win_threshold());
        assert_eq!(state.board.hash(), hash);
    }

    #[test]
    fn test_zero_probability_or_budget_falls_back() {
        let stones = [
            (6, 7, PlayerId::Player1),
            (7, 7, PlayerId::Player1),
            (8, 7, PlayerId::Player1),
        ];
        let ctx = context();
        let mut state = state_with(&stones);
        let mut never = ForcingExtension::new(0, 4, 10_000);
        assert_eq!(
            never.beyond_horizon(55, &mut state, PlayerId::Player1, PlayerId::Player1, &ctx),
            55
        );
        let mut starved = ForcingExtension::new(100, 4, 1);
        assert_eq!(
            starved.beyond_horizon(55, &mut state, PlayerId::Player1, PlayerId::Player1, &ctx),
            55
        );
    }
}
