//! 脅威評価器
//!
//! 候補マスに石を置いたときに4方向それぞれで増える脅威の重みを合計する。
//! 同じ局所配置は探索木のあちこちに現れるので、4方向の窓の組をキーに
//! 評価値をメモ化する。

use super::threat::{
    classify_window, scan_runs, window_key, Cell, Threat, ThreatWeights, Window, CENTER, WINDOW,
};
use crate::core::board::{AXES, WIN_LENGTH};
use crate::core::{Board, PlayerId, Position};
use parking_lot::RwLock;
use std::collections::HashMap;

/// 1方向あたりに見るマス数
const REACH: usize = 5;

const GROUP_CACHE_LIMIT: usize = 1 << 20;

pub struct ThreatEvaluator {
    weights: ThreatWeights,
    // 4方向の窓の組 → 評価値。重みに依存するので評価器ごとに持つ。
    group_cache: RwLock<HashMap<[u32; 4], i32>>,
}

impl ThreatEvaluator {
    pub fn new(weights: ThreatWeights) -> Self {
        ThreatEvaluator {
            weights,
            group_cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn weights(&self) -> &ThreatWeights {
        &self.weights
    }

    /// これ以上の評価値は勝ち (5連) を意味する
    #[inline]
    pub fn win_threshold(&self) -> i32 {
        self.weights.five()
    }

    /// `pos` を中心に `axis` 方向の11マスを切り出す
    ///
    /// 相手の石か盤端に当たったら、その先はすべてふさがりとする。
    pub fn window(
        board: &Board,
        pos: Position,
        player: PlayerId,
        axis: (i32, i32),
        center: Cell,
    ) -> Window {
        let mut window = [Cell::Blocked; WINDOW];
        window[CENTER] = center;
        for dir in [-1i32, 1] {
            for k in 1..=REACH {
                let step = dir * k as i32;
                let cell = match pos.offset(axis.0 * step, axis.1 * step, board.dimension()) {
                    None => Cell::Blocked,
                    Some(p) => match board.get(p) {
                        None => Cell::Empty,
                        Some(owner) if owner == player => Cell::Own,
                        Some(_) => Cell::Blocked,
                    },
                };
                if cell == Cell::Blocked {
                    break;
                }
                window[(CENTER as i32 + step) as usize] = cell;
            }
        }
        window
    }

    fn axis_score(&self, before: &Window) -> i32 {
        let mut after = *before;
        after[CENTER] = Cell::Own;
        let after_threat = classify_window(&after);
        if after_threat == Threat::Five {
            return self.weights.five();
        }
        self.weights.weight(after_threat) - self.weights.weight(classify_window(before))
    }

    /// `player` が空きマス `pos` に置いたときに増える脅威の重み
    ///
    /// 5連が完成する場合は勝ちの閾値以上を返す。空きでないマスは 0。
    pub fn evaluate(&self, board: &Board, pos: Position, player: PlayerId) -> i32 {
        if !board.is_empty_at(pos) {
            return 0;
        }
        let windows: [Window; 4] =
            AXES.map(|axis| Self::window(board, pos, player, axis, Cell::Empty));
        let key = windows.map(|w| window_key(&w));

        if let Some(&score) = self.group_cache.read().get(&key) {
            return score;
        }

        let mut total: i32 = 0;
        let mut completes_five = false;
        for w in windows.iter() {
            let s = self.axis_score(w);
            if s >= self.weights.five() {
                completes_five = true;
            }
            total = total.saturating_add(s);
        }
        if completes_five {
            total = total.max(self.weights.five());
        }

        let mut cache = self.group_cache.write();
        if cache.len() >= GROUP_CACHE_LIMIT {
            cache.clear();
        }
        cache.insert(key, total);
        total
    }

    /// 石を置いた後の4方向それぞれの分類
    pub fn axis_threats(&self, board: &Board, pos: Position, player: PlayerId) -> [Threat; 4] {
        AXES.map(|axis| classify_window(&Self::window(board, pos, player, axis, Cell::Own)))
    }

    /// 相手の応手を強いる手か (四以上、または活三2方向以上)
    pub fn is_forcing(&self, board: &Board, pos: Position, player: PlayerId) -> bool {
        if !board.is_empty_at(pos) {
            return false;
        }
        let threats = self.axis_threats(board, pos, player);
        threats.iter().any(|t| t.is_four_level())
            || threats.iter().filter(|t| t.is_live_three()).count() >= 2
    }

    /// 盤全体の `player` の脅威の合計と、5連があるかどうか
    fn color_score(&self, board: &Board, player: PlayerId) -> (i32, bool) {
        let n = board.dimension();
        let mut score: i32 = 0;
        let mut five = false;
        let mut cells: Vec<Cell> = Vec::with_capacity(n);
        for (start, (dx, dy)) in line_starts(n) {
            cells.clear();
            let mut curr = Some(start);
            while let Some(p) = curr {
                cells.push(match board.get(p) {
                    None => Cell::Empty,
                    Some(owner) if owner == player => Cell::Own,
                    Some(_) => Cell::Blocked,
                });
                curr = p.offset(dx, dy, n);
            }
            if cells.len() < WIN_LENGTH {
                continue;
            }
            scan_runs(&cells, true, |t| {
                if t == Threat::Five {
                    five = true;
                }
                score = score.saturating_add(self.weights.weight(t));
            });
        }
        (score, five)
    }

    /// 盤面の静的評価 (`player` から見た値)
    ///
    /// 自分の脅威の合計 − 相手の脅威の合計。5連がある場合は ±勝ちの閾値、
    /// それ以外は閾値未満に丸める。
    pub fn heuristic(&self, board: &Board, player: PlayerId) -> i32 {
        let five = self.weights.five();
        let (mine, my_five) = self.color_score(board, player);
        if my_five {
            return five;
        }
        let (theirs, their_five) = self.color_score(board, player.opponent());
        if their_five {
            return -five;
        }
        mine.saturating_sub(theirs).clamp(-(five - 1), five - 1)
    }
}

/// 盤上の全ての列 (行・列・両斜め) の始点と方向
fn line_starts(n: usize) -> impl Iterator<Item = (Position, (i32, i32))> {
    (0..n).flat_map(move |i| {
        let mut starts = vec![
            (Position::new(0, i), (1, 0)),
            (Position::new(i, 0), (0, 1)),
            (Position::new(i, 0), (1, 1)),
            (Position::new(0, i), (1, -1)),
        ];
        if i > 0 {
            starts.push((Position::new(0, i), (1, 1)));
            starts.push((Position::new(i, n - 1), (1, -1)));
        }
        starts
    })
}
