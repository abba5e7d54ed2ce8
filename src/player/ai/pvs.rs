//! Principal Variation Search (NegaScout)
//!
//! Negamax 形式。各ノードの最初の子だけを全幅の窓で探索し、残りはヌル窓で
//! 調べる。ヌル窓の結果が (α, β) の内側に入ったときだけ全幅で再探索する。

use super::strategy::{SearchContext, SearchOutcome, SearchState, SearchStrategy, INF};
use crate::core::{Move, PlayerId};

pub struct PvsStrategy {
    depth: usize,
}

impl PvsStrategy {
    pub fn new(depth: usize) -> Self {
        PvsStrategy {
            depth: depth.max(1),
        }
    }

    fn pvs(
        &mut self,
        state: &mut SearchState,
        depth: usize,
        mut alpha: i32,
        beta: i32,
        to_move: PlayerId,
        ctx: &SearchContext,
    ) -> i32 {
        ctx.count_node();
        let win = ctx.win_threshold();
        let h = ctx.heuristic(&state.board, to_move);
        if h >= win {
            return h.saturating_add(depth as i32);
        }
        if h <= -win {
            return h.saturating_sub(depth as i32);
        }
        if depth == 0 || ctx.expired() {
            return h;
        }

        let moves = ctx.ordered_moves(state, to_move);
        if moves.is_empty() {
            return h;
        }

        let opponent = to_move.opponent();
        let mut best = -INF;
        for (i, mv) in moves.iter().enumerate() {
            if state.place(mv.pos, to_move).is_err() {
                continue;
            }
            let score = if i == 0 {
                -self.pvs(state, depth - 1, -beta, -alpha, opponent, ctx)
            } else {
                let probe = -self.pvs(state, depth - 1, -alpha - 1, -alpha, opponent, ctx);
                if alpha < probe && probe < beta {
                    -self.pvs(state, depth - 1, -beta, -alpha, opponent, ctx)
                } else {
                    probe
                }
            };
            let _ = state.undo(mv.pos);

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta || ctx.is_cancelled() {
                break;
            }
        }
        best
    }

    pub fn search(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> (Option<Move>, i32) {
        ctx.count_node();
        if let Some(win) = ctx.immediate_win(state, player) {
            return (Some(win), ctx.win_threshold());
        }

        let moves = ctx.ordered_moves(state, player);
        let opponent = player.opponent();
        let mut alpha = -INF;
        let mut best: Option<Move> = None;
        let mut ties: Vec<Move> = Vec::new();
        for mv in moves {
            if state.place(mv.pos, player).is_err() {
                continue;
            }
            let score = if best.is_none() {
                -self.pvs(state, self.depth - 1, -INF, INF, opponent, ctx)
            } else {
                // 同点を拾うため、ランダム選択時はヌル窓を1つ下げる
                let floor = if ctx.randomized { alpha - 1 } else { alpha };
                let probe = -self.pvs(state, self.depth - 1, -floor - 1, -floor, opponent, ctx);
                if probe > floor {
                    -self.pvs(state, self.depth - 1, -INF, -floor, opponent, ctx)
                } else {
                    probe
                }
            };
            let _ = state.undo(mv.pos);

            if ctx.is_cancelled() && best.is_some() {
                break;
            }
            if best.is_none() || score > alpha {
                alpha = score;
                best = Some(Move::new(mv.pos, score));
                ties.clear();
                ties.push(Move::new(mv.pos, score));
            } else if score == alpha && ctx.randomized {
                ties.push(Move::new(mv.pos, score));
            }
            if ctx.is_cancelled() {
                break;
            }
        }
        (ctx.pick(&ties), alpha)
    }
}

impl SearchStrategy for PvsStrategy {
    fn name(&self) -> &'static str {
        "negaScout"
    }

    fn select_move(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> SearchOutcome {
        let (best, value) = self.search(state, player, ctx);
        log::trace!("pvs depth {} value {} nodes {}", self.depth, value, ctx.nodes());
        SearchOutcome {
            best,
            depth: self.depth,
            cancelled: ctx.is_cancelled(),
            nodes: ctx.nodes(),
        }
    }
}
