use serde::{Deserialize, Serialize};
use std::fmt;

/// プレイヤーID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    Player1, // 先手 (黒)
    Player2, // 後手 (白)
}

impl Default for PlayerId {
    fn default() -> Self {
        PlayerId::Player1
    }
}

impl PlayerId {
    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::Player1 => PlayerId::Player2,
            PlayerId::Player2 => PlayerId::Player1,
        }
    }

    /// Zobrist テーブル等の添字
    #[inline]
    pub fn index(self) -> usize {
        match self {
            PlayerId::Player1 => 0,
            PlayerId::Player2 => 1,
        }
    }

    /// 手数(0始まり)から手番を求める。先手から交互。
    pub fn for_ply(ply: usize) -> PlayerId {
        if ply % 2 == 0 {
            PlayerId::Player1
        } else {
            PlayerId::Player2
        }
    }
}

/// 盤面座標 (0-indexed, x = 列, y = 行)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// 符号付きオフセットを適用。盤外なら None
    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dimension: usize) -> Option<Position> {
        let x = self.x as i32 + dx;
        let y = self.y as i32 + dy;
        if x >= 0 && x < dimension as i32 && y >= 0 && y < dimension as i32 {
            Some(Position::new(x as usize, y as usize))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 盤面同一性の判定方法
///
/// `Probabilistic` はハッシュのみで比較するため衝突の可能性を受け入れる。
/// 明示的に選択した場合にのみ使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EqualityMode {
    Strict,
    #[default]
    Probabilistic,
}
