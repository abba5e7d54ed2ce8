use super::types::{EqualityMode, PlayerId, Position};
use crate::error::{BoardError, MoveError};
use crate::logic::zobrist::ZobristTable;
use std::sync::Arc;

/// 4方向 (横, 縦, 右下がり斜め, 右上がり斜め)
pub const AXES: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// 勝ちに必要な連の長さ
pub const WIN_LENGTH: usize = 5;

/// 盤面 (N×N) と差分更新されるハッシュ
#[derive(Debug, Clone)]
pub struct Board {
    dimension: usize,
    cells: Vec<Option<PlayerId>>,
    stones: usize,
    /// Zobrist Hash (現在の盤面ハッシュ)
    hash: u64,
    zobrist: Arc<ZobristTable>,
}

impl Board {
    pub fn new(dimension: usize) -> Result<Self, BoardError> {
        if dimension == 0 {
            return Err(BoardError::InvalidDimension(dimension));
        }
        Ok(Self::with_table(ZobristTable::for_dimension(dimension)))
    }

    /// 既存のテーブルで空の盤面を作る
    pub fn with_table(zobrist: Arc<ZobristTable>) -> Self {
        let dimension = zobrist.dimension();
        Board {
            dimension,
            cells: vec![None; dimension * dimension],
            stones: 0,
            hash: 0,
            zobrist,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// 手番込みのハッシュ。手番に依存するキャッシュのキーに使う。
    #[inline]
    pub fn hash_for(&self, player: PlayerId) -> u64 {
        self.hash ^ self.zobrist.side(player)
    }

    pub fn zobrist(&self) -> &Arc<ZobristTable> {
        &self.zobrist
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.dimension && pos.y < self.dimension
    }

    #[inline]
    pub fn index(&self, pos: Position) -> usize {
        pos.y * self.dimension + pos.x
    }

    #[inline]
    pub fn position(&self, index: usize) -> Position {
        Position::new(index % self.dimension, index / self.dimension)
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Option<PlayerId> {
        if self.in_bounds(pos) {
            self.cells[self.index(pos)]
        } else {
            None
        }
    }

    #[inline]
    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.in_bounds(pos) && self.cells[self.index(pos)].is_none()
    }

    pub fn cells(&self) -> &[Option<PlayerId>] {
        &self.cells
    }

    pub fn stone_count(&self) -> usize {
        self.stones
    }

    pub fn is_board_empty(&self) -> bool {
        self.stones == 0
    }

    pub fn is_full(&self) -> bool {
        self.stones == self.cells.len()
    }

    pub fn center(&self) -> Position {
        Position::new(self.dimension / 2, self.dimension / 2)
    }

    fn check_bounds(&self, pos: Position) -> Result<(), MoveError> {
        if self.in_bounds(pos) {
            Ok(())
        } else {
            Err(MoveError::OutOfBounds {
                position: pos,
                dimension: self.dimension,
            })
        }
    }

    /// 石を置く。盤外・既に石がある場合は盤面を変えずにエラーを返す。
    pub fn place(&mut self, pos: Position, player: PlayerId) -> Result<(), MoveError> {
        self.check_bounds(pos)?;
        let idx = self.index(pos);
        if self.cells[idx].is_some() {
            return Err(MoveError::Occupied { position: pos });
        }
        self.cells[idx] = Some(player);
        self.hash ^= self.zobrist.stone(pos, player);
        self.stones += 1;
        Ok(())
    }

    /// 石を取り除く。XORは自己逆元なので place と完全に逆操作になる。
    pub fn undo(&mut self, pos: Position) -> Result<PlayerId, MoveError> {
        self.check_bounds(pos)?;
        let idx = self.index(pos);
        let player = self.cells[idx].ok_or(MoveError::Empty { position: pos })?;
        self.cells[idx] = None;
        self.hash ^= self.zobrist.stone(pos, player);
        self.stones -= 1;
        Ok(player)
    }

    /// 盤面の同一性判定
    ///
    /// `Probabilistic` はハッシュのみを比較するため、衝突時は誤って一致と判定する。
    pub fn same_position(&self, other: &Board, mode: EqualityMode) -> bool {
        if self.dimension != other.dimension {
            return false;
        }
        match mode {
            EqualityMode::Strict => self.cells == other.cells,
            EqualityMode::Probabilistic => self.hash == other.hash,
        }
    }

    /// `pos` の石が5連以上の一部か (長連も勝ち)
    pub fn is_five_at(&self, pos: Position) -> bool {
        let Some(player) = self.get(pos) else {
            return false;
        };
        AXES.iter().any(|&(dx, dy)| {
            let count = 1
                + self.count_direction(pos, dx, dy, player)
                + self.count_direction(pos, -dx, -dy, player);
            count >= WIN_LENGTH
        })
    }

    fn count_direction(&self, pos: Position, dx: i32, dy: i32, player: PlayerId) -> usize {
        let mut count = 0;
        let mut curr = pos;
        while let Some(next) = curr.offset(dx, dy, self.dimension) {
            if self.cells[self.index(next)] != Some(player) {
                break;
            }
            count += 1;
            curr = next;
        }
        count
    }

    /// 盤上に5連があればその色を返す
    pub fn winner(&self) -> Option<PlayerId> {
        (0..self.cells.len())
            .map(|i| self.position(i))
            .find(|&pos| self.is_five_at(pos))
            .and_then(|pos| self.get(pos))
    }

    /// 石の一覧 (行優先)
    pub fn stones(&self) -> impl Iterator<Item = (Position, PlayerId)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|p| (self.position(i), p)))
    }

    /// 色を入れ替えた盤面
    pub fn swapped_colors(&self) -> Board {
        let mut swapped = Board::with_table(Arc::clone(&self.zobrist));
        for (pos, player) in self.stones() {
            // 同じサイズの空盤面なので失敗しない
            let _ = swapped.place(pos, player.opponent());
        }
        swapped
    }

    /// 差分更新を使わずにハッシュを計算し直す (検証用)
    pub fn recompute_hash(&self) -> u64 {
        self.stones()
            .fold(0, |h, (pos, player)| h ^ self.zobrist.stone(pos, player))
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.same_position(other, EqualityMode::Strict)
    }
}

impl Eq for Board {}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(n: usize) -> Board {
        Board::with_table(Arc::new(ZobristTable::with_seed(n, 1)))
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(Board::new(0).unwrap_err(), BoardError::InvalidDimension(0));
    }

    #[test]
    fn test_place_undo_restores_hash() {
        let mut b = board(15);
        b.place(Position::new(7, 7), PlayerId::Player1).unwrap();
        let before = b.hash();
        b.place(Position::new(8, 8), PlayerId::Player2).unwrap();
        assert_ne!(b.hash(), before);
        assert_eq!(b.undo(Position::new(8, 8)).unwrap(), PlayerId::Player2);
        assert_eq!(b.hash(), before);
        assert_eq!(b.hash(), b.recompute_hash());
    }

    #[test]
    fn test_invalid_moves_leave_board_untouched() {
        let mut b = board(5);
        b.place(Position::new(2, 2), PlayerId::Player1).unwrap();
        let hash = b.hash();
        assert_eq!(
            b.place(Position::new(2, 2), PlayerId::Player2),
            Err(MoveError::Occupied {
                position: Position::new(2, 2)
            })
        );
        assert!(matches!(
            b.place(Position::new(5, 0), PlayerId::Player2),
            Err(MoveError::OutOfBounds { .. })
        ));
        assert!(matches!(
            b.undo(Position::new(0, 0)),
            Err(MoveError::Empty { .. })
        ));
        assert_eq!(b.hash(), hash);
        assert_eq!(b.stone_count(), 1);
    }

    #[test]
    fn test_five_detection_all_axes() {
        for &(dx, dy) in AXES.iter() {
            let mut b = board(9);
            let start = Position::new(4, 4);
            for i in -2..=2 {
                let p = start.offset(dx * i, dy * i, 9).unwrap();
                b.place(p, PlayerId::Player2).unwrap();
            }
            assert!(b.is_five_at(start), "axis ({}, {})", dx, dy);
            assert_eq!(b.winner(), Some(PlayerId::Player2));
        }
    }

    #[test]
    fn test_four_is_not_five() {
        let mut b = board(9);
        for x in 0..4 {
            b.place(Position::new(x, 0), PlayerId::Player1).unwrap();
        }
        assert!(!b.is_five_at(Position::new(3, 0)));
        assert_eq!(b.winner(), None);
    }

    #[test]
    fn test_equality_modes() {
        let mut a = board(7);
        let mut b = board(7);
        a.place(Position::new(1, 1), PlayerId::Player1).unwrap();
        b.place(Position::new(1, 1), PlayerId::Player1).unwrap();
        assert!(a.same_position(&b, EqualityMode::Strict));
        assert!(a.same_position(&b, EqualityMode::Probabilistic));
        b.place(Position::new(2, 1), PlayerId::Player2).unwrap();
        assert!(!a.same_position(&b, EqualityMode::Strict));
        assert!(!a.same_position(&b, EqualityMode::Probabilistic));
    }

    #[test]
    fn test_swapped_colors() {
        let mut b = board(7);
        b.place(Position::new(0, 0), PlayerId::Player1).unwrap();
        b.place(Position::new(1, 0), PlayerId::Player2).unwrap();
        let s = b.swapped_colors();
        assert_eq!(s.get(Position::new(0, 0)), Some(PlayerId::Player2));
        assert_eq!(s.get(Position::new(1, 0)), Some(PlayerId::Player1));
        assert_eq!(s.swapped_colors(), b);
    }
}
