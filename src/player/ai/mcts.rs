//! モンテカルロ木探索
//!
//! 選択 (UCB1) → 展開 → シミュレーション (貪欲法で `sim_depth` 手まで、
//! または5連ができるまで) → 逆伝播。最終的には訪問回数が最大の子を選ぶ。
//!
//! ノードは配列 (アリーナ) に置き、親子は添字で結ぶ。

use super::basic::basic_move;
use super::strategy::{SearchContext, SearchOutcome, SearchState, SearchStrategy};
use super::threat::Threat;
use crate::core::{Move, PlayerId, Position};
use rand::seq::SliceRandom;

struct Node {
    /// このノードに至った手 (ルートは `None`)
    pos: Option<Position>,
    /// その手を打った側。`total` はこの側から見た値の合計。
    mover: PlayerId,
    parent: Option<usize>,
    children: Vec<usize>,
    untried: Vec<Position>,
    visits: u32,
    total: f64,
    terminal: bool,
}

impl Node {
    fn average(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total / self.visits as f64
        }
    }
}

pub struct MctsStrategy {
    iterations: usize,
    exploration: f64,
    sim_depth: usize,
    nodes: Vec<Node>,
}

impl MctsStrategy {
    pub fn new(iterations: usize, exploration: f64, sim_depth: usize) -> Self {
        MctsStrategy {
            iterations: iterations.max(1),
            exploration,
            sim_depth,
            nodes: Vec::new(),
        }
    }

    /// 展開候補。強い脅威に関わる手があればそれだけに絞る。
    fn expansion_candidates(
        state: &SearchState,
        to_move: PlayerId,
        ctx: &SearchContext,
    ) -> Vec<Position> {
        let ranked = ctx.ordered_moves(state, to_move);
        let weights = ctx.evaluator.weights();
        let five = weights.five();
        let four = [Threat::StraightFour, Threat::BlockedFour, Threat::PokedFour]
            .iter()
            .map(|&t| weights.weight(t))
            .min()
            .unwrap_or(five);
        let thresholds = [
            five.saturating_mul(2),
            five,
            four,
            weights.weight(Threat::StraightThree),
        ];

        let mut chosen: Vec<Position> = ranked.iter().map(|m| m.pos).collect();
        for threshold in thresholds {
            if threshold <= 0 {
                continue;
            }
            let filtered: Vec<Position> = ranked
                .iter()
                .filter(|m| m.score >= threshold)
                .map(|m| m.pos)
                .collect();
            if !filtered.is_empty() {
                chosen = filtered;
                break;
            }
        }

        if ctx.randomized {
            ctx.with_rng(|rng| chosen.shuffle(rng));
        } else {
            // pop() で良い順に取り出す
            chosen.reverse();
        }
        chosen
    }

    fn add_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn ucb_child(&self, index: usize) -> usize {
        let parent = &self.nodes[index];
        let ln_n = (parent.visits.max(1) as f64).ln();
        let mut best = parent.children[0];
        let mut best_value = f64::NEG_INFINITY;
        for &child in &parent.children {
            let node = &self.nodes[child];
            let n = node.visits.max(1) as f64;
            let value = (node.average() + 1.0) / 2.0 + self.exploration * (ln_n / n).sqrt();
            if value > best_value {
                best_value = value;
                best = child;
            }
        }
        best
    }

    /// `mover` が打った直後の局面を評価する。値は [-1, 1]、`mover` から見た値。
    fn simulate(&self, state: &mut SearchState, mover: PlayerId, ctx: &SearchContext) -> f64 {
        let mut played: Vec<Position> = Vec::new();
        let mut to_move = mover.opponent();
        let mut outcome: Option<f64> = None;
        for _ in 0..self.sim_depth {
            let Some(mv) = basic_move(state, &ctx.evaluator, to_move) else {
                break;
            };
            if state.place(mv.pos, to_move).is_err() {
                break;
            }
            played.push(mv.pos);
            if state.board.is_five_at(mv.pos) {
                outcome = Some(if to_move == mover { 1.0 } else { -1.0 });
                break;
            }
            to_move = to_move.opponent();
        }

        let value = outcome.unwrap_or_else(|| {
            let h = ctx.heuristic(&state.board, mover) as f64;
            (h / ctx.win_threshold() as f64).clamp(-1.0, 1.0)
        });
        for pos in played.into_iter().rev() {
            let _ = state.undo(pos);
        }
        value
    }

    fn backpropagate(&mut self, mut index: usize, mut value: f64) {
        loop {
            let node = &mut self.nodes[index];
            node.visits += 1;
            node.total += value;
            match node.parent {
                Some(parent) => {
                    index = parent;
                    value = -value;
                }
                None => break,
            }
        }
    }

    fn iterate(&mut self, state: &mut SearchState, ctx: &SearchContext) {
        let mut applied: Vec<Position> = Vec::new();
        let mut index = 0;

        // 選択
        while self.nodes[index].untried.is_empty()
            && !self.nodes[index].children.is_empty()
            && !self.nodes[index].terminal
        {
            index = self.ucb_child(index);
            let node = &self.nodes[index];
            if let Some(pos) = node.pos {
                if state.place(pos, node.mover).is_ok() {
                    applied.push(pos);
                }
            }
        }

        // 展開
        if !self.nodes[index].terminal {
            if let Some(pos) = self.nodes[index].untried.pop() {
                let mover = self.nodes[index].mover.opponent();
                if state.place(pos, mover).is_ok() {
                    applied.push(pos);
                    let terminal = state.board.is_five_at(pos);
                    let untried = if terminal {
                        Vec::new()
                    } else {
                        Self::expansion_candidates(state, mover.opponent(), ctx)
                    };
                    let child = self.add_node(Node {
                        pos: Some(pos),
                        mover,
                        parent: Some(index),
                        children: Vec::new(),
                        untried,
                        visits: 0,
                        total: 0.0,
                        terminal,
                    });
                    self.nodes[index].children.push(child);
                    index = child;
                }
            }
        }

        // シミュレーション
        let node = &self.nodes[index];
        let value = if node.terminal {
            1.0
        } else if node.pos.is_none() {
            0.0
        } else {
            self.simulate(state, node.mover, ctx)
        };

        self.backpropagate(index, value);
        for pos in applied.into_iter().rev() {
            let _ = state.undo(pos);
        }
    }

    /// 木を育てて、最も訪問された子を返す
    pub fn run(&mut self, state: &mut SearchState, player: PlayerId, ctx: &SearchContext) -> Option<Move> {
        self.nodes.clear();
        let untried = Self::expansion_candidates(state, player, ctx);
        self.add_node(Node {
            pos: None,
            mover: player.opponent(),
            parent: None,
            children: Vec::new(),
            untried,
            visits: 0,
            total: 0.0,
            terminal: false,
        });

        let mut iterations = 0;
        while iterations < self.iterations {
            // 少なくとも1回は展開する
            if iterations > 0 && ctx.expired() {
                break;
            }
            self.iterate(state, ctx);
            ctx.count_node();
            iterations += 1;
        }
        log::debug!(
            "mcts: {} iterations, {} nodes, root visits {}",
            iterations,
            self.nodes.len(),
            self.nodes[0].visits
        );

        self.most_visited()
    }

    fn most_visited(&self) -> Option<Move> {
        self.nodes[0]
            .children
            .iter()
            .map(|&c| &self.nodes[c])
            .max_by_key(|n| n.visits)
            .and_then(|n| {
                let score = (n.average() * 1000.0) as i32;
                n.pos.map(|p| Move::new(p, score))
            })
    }
}

impl SearchStrategy for MctsStrategy {
    fn name(&self) -> &'static str {
        "monteCarlo"
    }

    fn select_move(
        &mut self,
        state: &mut SearchState,
        player: PlayerId,
        ctx: &SearchContext,
    ) -> SearchOutcome {
        if let Some(win) = ctx.immediate_win(state, player) {
            return SearchOutcome {
                best: Some(win),
                depth: 1,
                cancelled: false,
                nodes: 1,
            };
        }

        let best = self.run(state, player, ctx);
        SearchOutcome {
            best,
            depth: 1,
            cancelled: false,
            nodes: ctx.nodes(),
        }
    }
}
