//! エンジンのエラー型
//!
//! 盤面操作のエラーはすべて回復可能で、呼び出し側は手を拒否して元の局面を保つ。

use crate::core::Position;
use thiserror::Error;

/// 盤面への着手・取り消しの失敗
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("position {position} is outside the {dimension}x{dimension} board")]
    OutOfBounds { position: Position, dimension: usize },

    #[error("position {position} is already occupied")]
    Occupied { position: Position },

    #[error("position {position} has no stone to undo")]
    Empty { position: Position },

    #[error("game already over")]
    GameOver,

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    #[error("board dimension must be at least 1, got {0}")]
    InvalidDimension(usize),
}

/// 棋譜文字列 `"<dimension>|<col>,<row>;..."` の読み込み失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing '|' separator in '{0}'")]
    MissingSeparator(String),

    #[error("invalid dimension '{0}'")]
    InvalidDimension(String),

    #[error("empty move segment at index {index}")]
    EmptySegment { index: usize },

    #[error("invalid coordinate '{segment}' at index {index}")]
    InvalidCoordinate { segment: String, index: usize },

    #[error("move {index} rejected by board: {source}")]
    IllegalMove {
        index: usize,
        #[source]
        source: MoveError,
    },

    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("weight for {threat} must be non-negative, got {value}")]
    NegativeWeight { threat: String, value: i32 },

    #[error("Five weight {five} must exceed every other weight (max other: {max_other})")]
    FiveNotDominant { five: i32, max_other: i32 },

    #[error("Five weight {five} exceeds the search limit {max}")]
    FiveTooLarge { five: i32, max: i32 },
}
