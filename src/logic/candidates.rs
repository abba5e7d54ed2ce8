//! 候補手の生成
//!
//! 既存の石から距離2以内 (縦横斜め) の空きマスだけを「アクティブ」として
//! 評価対象にする。着手ごとの差分をスタックに積み、取り消しで正確に戻す。

use crate::core::{Board, Move, PlayerId, Position};
use crate::player::ai::eval::ThreatEvaluator;

const RADIUS: i32 = 2;

#[derive(Debug, Clone)]
struct ActivationDiff {
    played: usize,
    was_active: bool,
    activated: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    dimension: usize,
    active: Vec<bool>,
    diffs: Vec<ActivationDiff>,
}

impl CandidateGenerator {
    /// 盤面全体を走査して初期状態を作る
    pub fn from_board(board: &Board) -> Self {
        let n = board.dimension();
        let mut active = vec![false; n * n];
        for (pos, _) in board.stones() {
            for idx in neighborhood(pos, n) {
                if board.cells()[idx].is_none() {
                    active[idx] = true;
                }
            }
        }
        CandidateGenerator {
            dimension: n,
            active,
            diffs: Vec::new(),
        }
    }

    /// `pos` に石が置かれた直後に呼ぶ
    pub fn place(&mut self, board: &Board, pos: Position) {
        let n = self.dimension;
        let played = pos.y * n + pos.x;
        let was_active = self.active[played];
        self.active[played] = false;

        let mut activated = Vec::new();
        for idx in neighborhood(pos, n) {
            if !self.active[idx] && board.cells()[idx].is_none() {
                self.active[idx] = true;
                activated.push(idx);
            }
        }
        self.diffs.push(ActivationDiff {
            played,
            was_active,
            activated,
        });
    }

    /// 直前の `place` を取り消す
    pub fn undo(&mut self) {
        if let Some(diff) = self.diffs.pop() {
            for idx in diff.activated {
                self.active[idx] = false;
            }
            self.active[diff.played] = diff.was_active;
        }
    }

    #[inline]
    pub fn is_active(&self, pos: Position) -> bool {
        pos.x < self.dimension && pos.y < self.dimension && self.active[pos.y * self.dimension + pos.x]
    }

    pub fn active_cells(&self) -> impl Iterator<Item = Position> + '_ {
        let n = self.dimension;
        self.active
            .iter()
            .enumerate()
            .filter(|(_, &a)| a)
            .map(move |(i, _)| Position::new(i % n, i / n))
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// アクティブなマスを `player` の評価値で降順に並べる (同点は行優先の順)
    pub fn ranked_moves(&self, board: &Board, evaluator: &ThreatEvaluator, player: PlayerId) -> Vec<Move> {
        let mut moves: Vec<Move> = self
            .active_cells()
            .map(|pos| Move::new(pos, evaluator.evaluate(board, pos, player)))
            .collect();
        moves.sort_by(|a, b| b.score.cmp(&a.score));
        moves
    }

    /// 上位 `k` 手のみ
    pub fn ranked_moves_top(
        &self,
        board: &Board,
        evaluator: &ThreatEvaluator,
        player: PlayerId,
        k: usize,
    ) -> Vec<Move> {
        let mut moves = self.ranked_moves(board, evaluator, player);
        moves.truncate(k);
        moves
    }

    /// 攻防両面の評価: max(自分の評価, 相手の評価)
    ///
    /// 相手の急所は自分の急所でもある。自分の勝ち手は常に先頭に来る。
    pub fn ranked_moves_zero_sum(
        &self,
        board: &Board,
        evaluator: &ThreatEvaluator,
        player: PlayerId,
        k: usize,
    ) -> Vec<Move> {
        let win = evaluator.win_threshold();
        let mut moves: Vec<Move> = self
            .active_cells()
            .map(|pos| {
                let mine = evaluator.evaluate(board, pos, player);
                let score = if mine >= win {
                    mine.saturating_add(win)
                } else {
                    mine.max(evaluator.evaluate(board, pos, player.opponent()))
                };
                Move::new(pos, score)
            })
            .collect();
        moves.sort_by(|a, b| b.score.cmp(&a.score));
        moves.truncate(k);
        moves
    }
}

fn neighborhood(pos: Position, n: usize) -> impl Iterator<Item = usize> {
    (-RADIUS..=RADIUS)
        .flat_map(|dy| (-RADIUS..=RADIUS).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .filter_map(move |(dx, dy)| pos.offset(dx, dy, n))
        .map(move |p| p.y * n + p.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::zobrist::ZobristTable;
    use crate::player::ai::threat::ThreatWeights;
    use std::sync::Arc;

    fn board(n: usize) -> Board {
        Board::with_table(Arc::new(ZobristTable::with_seed(n, 5)))
    }

    #[test]
    fn test_empty_board_has_no_candidates() {
        let b = board(15);
        assert_eq!(CandidateGenerator::from_board(&b).active_count(), 0);
    }

    #[test]
    fn test_radius_two_activation() {
        let mut b = board(15);
        let mut gen = CandidateGenerator::from_board(&b);
        let pos = Position::new(7, 7);
        b.place(pos, PlayerId::Player1).unwrap();
        gen.place(&b, pos);
        assert_eq!(gen.active_count(), 24);
        assert!(!gen.is_active(pos));
        assert!(gen.is_active(Position::new(9, 9)));
        assert!(!gen.is_active(Position::new(10, 7)));

        // 角では盤内の分だけ
        let mut c = board(15);
        let mut gen = CandidateGenerator::from_board(&c);
        c.place(Position::new(0, 0), PlayerId::Player2).unwrap();
        gen.place(&c, Position::new(0, 0));
        assert_eq!(gen.active_count(), 8);
    }

    #[test]
    fn test_undo_reverses_exactly() {
        let mut b = board(9);
        let mut gen = CandidateGenerator::from_board(&b);
        let moves = [
            (Position::new(4, 4), PlayerId::Player1),
            (Position::new(5, 5), PlayerId::Player2),
            (Position::new(6, 4), PlayerId::Player1),
        ];
        let mut snapshots = vec![gen.active.clone()];
        for (pos, p) in moves {
            b.place(pos, p).unwrap();
            gen.place(&b, pos);
            snapshots.push(gen.active.clone());
        }
        for (pos, _) in moves.iter().rev() {
            snapshots.pop();
            b.undo(*pos).unwrap();
            gen.undo();
            assert_eq!(&gen.active, snapshots.last().unwrap());
        }
        // 差分更新の結果は全走査と一致する
        b.place(Position::new(4, 4), PlayerId::Player1).unwrap();
        gen.place(&b, Position::new(4, 4));
        assert_eq!(gen.active, CandidateGenerator::from_board(&b).active);
    }

    #[test]
    fn test_ranked_moves_sorted_and_truncated() {
        let mut b = board(15);
        for x in 5..8 {
            b.place(Position::new(x, 7), PlayerId::Player1).unwrap();
        }
        let gen = CandidateGenerator::from_board(&b);
        let ev = ThreatEvaluator::new(ThreatWeights::default());
        let ranked = gen.ranked_moves(&b, &ev, PlayerId::Player1);
        assert_eq!(ranked.len(), gen.active_count());
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        let top = gen.ranked_moves_top(&b, &ev, PlayerId::Player1, 2);
        assert_eq!(top.len(), 2);
        let ends = [Position::new(4, 7), Position::new(8, 7)];
        assert!(top.iter().all(|m| ends.contains(&m.pos)));
    }

    #[test]
    fn test_zero_sum_ranks_blocks_first() {
        let mut b = board(15);
        for y in 7..=10 {
            b.place(Position::new(7, y), PlayerId::Player1).unwrap();
        }
        b.place(Position::new(3, 3), PlayerId::Player2).unwrap();
        let gen = CandidateGenerator::from_board(&b);
        let ev = ThreatEvaluator::new(ThreatWeights::default());
        let top = gen.ranked_moves_zero_sum(&b, &ev, PlayerId::Player2, 2);
        let blocks = [Position::new(7, 6), Position::new(7, 11)];
        assert!(top.iter().all(|m| blocks.contains(&m.pos)));
    }
}
