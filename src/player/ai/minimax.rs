//! 深さ固定の Minimax (αβ枝刈り付き)
//!
//! 葉の値は探索開始側 (root) から見た静的評価。どちらかに5連ができた局面は
//! 終端として扱い、早い勝ち・遅い負けを好むよう残り深さを加減する。

use super::horizon::{AcceptHeuristic, HorizonPolicy};
use super::strategy::{SearchContext, SearchOutcome, SearchState, SearchStrategy, INF};
use crate::core::{Move, PlayerId};

pub struct MinimaxStrategy {
    depth: usize,
    alpha_beta: bool,
    horizon: Box<dyn HorizonPolicy>,
}

impl MinimaxStrategy {
    pub fn new(depth: usize) -> Self {
        Self::with_horizon(depth, Box::new(AcceptHeuristic))
    }

    pub fn with_horizon(depth: usize, horizon: Box<dyn HorizonPolicy>) -> Self {
        MinimaxStrategy {
            depth: depth.max(1),
            alpha_beta: true,
            horizon,
        }
    }

    /// 枝刈りなし (比較用)
    pub fn unpruned(mut self) -> Self {
        self.alpha_beta = false;
        self
    }

    /// ルートの最善手とその値
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
        let mut best_value = -INF;
        let mut ties: Vec<Move> = Vec::new();
        for mv in moves {
            // 同点の手をすべて正確に得るため、ランダム選択時は窓を1つ広げる
            let alpha = if ctx.randomized {
                best_value.saturating_sub(1)
            } else {
                best_value
            };
            let alpha = if self.alpha_beta { alpha } else { -INF };
            if state.place(mv.pos, player).is_err() {
                continue;
            }
            let value = self.value(state, self.depth - 1, alpha, INF, player.opponent(), player, ctx);
            let _ = state.undo(mv.pos);

            if ctx.is_cancelled() && !ties.is_empty() {
                break;
            }
            if value > best_value {
                best_value = value;
                ties.clear();
                ties.push(Move::new(mv.pos, value));
            } else if value == best_value {
                ties.push(Move::new(mv.pos, value));
            }
            if ctx.is_cancelled() {
                break;
            }
        }
        (ctx.pick(&ties), best_value)
    }

    #[allow(clippy::too_many_arguments)]
    fn value(
        &mut self,
        state: &mut SearchState,
        depth: usize,
        mut alpha: i32,
        mut beta: i32,
        to_move: PlayerId,
        root: PlayerId,
        ctx: &SearchContext,
    ) -> i32 {
        ctx.count_node();
        let win = ctx.win_threshold();
        let h = ctx.heuristic(&state.board, root);
        if h >= win {
            return h.saturating_add(depth as i32);
        }
        if h <= -win {
            return h.saturating_sub(depth as i32);
        }
        if depth == 0 {
            return self.horizon.beyond_horizon(h, state, to_move, root, ctx);
        }
        if ctx.expired() {
            return h;
        }

        let moves = ctx.ordered_moves(state, to_move);
        if moves.is_empty() {
            return h;
        }

        let maximizing = to_move == root;
        let mut best = if maximizing { -INF } else { INF };
        for mv in moves {
            if state.place(mv.pos, to_move).is_err() {
                continue;
            }
            let v = self.value(state, depth - 1, alpha, beta, to_move.opponent(), root, ctx);
            let _ = state.undo(mv.pos);

            if maximizing {
                best = best.max(v);
                if self.alpha_beta {
                    alpha = alpha.max(v);
                }
            } else {
                best = best.min(v);
                if self.alpha_beta {
                    beta = beta.min(v);
                }
            }
            if self.alpha_beta && alpha >= beta {
                break;
            }
            if ctx.is_cancelled() {
                break;
            }
        }
        best
    }
}

impl SearchStrategy for MinimaxStrategy {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn select_move(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> SearchOutcome {
        let (best, value) = self.search(state, player, ctx);
        log::trace!("minimax depth {} value {} nodes {}", self.depth, value, ctx.nodes());
        SearchOutcome {
            best,
            depth: self.depth,
            cancelled: ctx.is_cancelled(),
            nodes: ctx.nodes(),
        }
    }
}
