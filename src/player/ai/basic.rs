//! 一手読みの戦略
//!
//! - `BasicStrategy`: 自分の最善手と相手の最善手 (= 止める手) の良い方
//! - `ZeroSumStrategy`: 各マスを max(自分の評価, 相手の評価) で評価する

use super::eval::ThreatEvaluator;
use super::strategy::{SearchContext, SearchOutcome, SearchState, SearchStrategy};
use crate::core::{Move, PlayerId};

/// 候補の中で `player` の評価が最大の手 (同点はすべて、盤の行優先順)
fn best_for(state: &SearchState, evaluator: &ThreatEvaluator, player: PlayerId) -> Vec<Move> {
    let mut best: Vec<Move> = Vec::new();
    for pos in state.candidates.active_cells() {
        let score = evaluator.evaluate(&state.board, pos, player);
        match best.first() {
            Some(b) if score < b.score => {}
            Some(b) if score == b.score => best.push(Move::new(pos, score)),
            _ => best = vec![Move::new(pos, score)],
        }
    }
    best
}

/// 貪欲法で選ぶ同点の手の集合。候補が無ければ空。
///
/// 自分が勝てるならその手、相手に勝ちの手があればそれを止める。
/// それ以外は攻めと守りで評価の高い方。
fn basic_ties(state: &SearchState, evaluator: &ThreatEvaluator, player: PlayerId) -> Vec<Move> {
    let win = evaluator.win_threshold();
    let attack = best_for(state, evaluator, player);
    let Some(a) = attack.first().map(|m| m.score) else {
        return attack;
    };
    if a >= win {
        return attack;
    }
    let defence = best_for(state, evaluator, player.opponent());
    match defence.first().map(|m| m.score) {
        Some(d) if d >= win || d > a => defence,
        _ => attack,
    }
}

/// 貪欲法による一手 (同点は先に見つけた方)。候補が無ければ `None`。
pub fn basic_move(state: &SearchState, evaluator: &ThreatEvaluator, player: PlayerId) -> Option<Move> {
    basic_ties(state, evaluator, player).first().copied()
}

pub struct BasicStrategy;

impl SearchStrategy for BasicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn select_move(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> SearchOutcome {
        ctx.count_node();
        SearchOutcome {
            best: ctx.pick(&basic_ties(state, &ctx.evaluator, player)),
            depth: 1,
            cancelled: false,
            nodes: ctx.nodes(),
        }
    }
}

pub struct ZeroSumStrategy;

impl SearchStrategy for ZeroSumStrategy {
    fn name(&self) -> &'static str {
        "zeroSum"
    }

    fn select_move(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> SearchOutcome {
        ctx.count_node();
        let best = match ctx.immediate_win(state, player) {
            Some(win) => Some(win),
            None => {
                let ranked = state.candidates.ranked_moves_zero_sum(
                    &state.board,
                    &ctx.evaluator,
                    player,
                    usize::MAX,
                );
                let top = ranked.first().map(|m| m.score);
                let ties: Vec<Move> = ranked
                    .into_iter()
                    .take_while(|m| Some(m.score) == top)
                    .collect();
                ctx.pick(&ties)
            }
        };
        SearchOutcome {
            best,
            depth: 1,
            cancelled: false,
            nodes: ctx.nodes(),
        }
    }
}
