use super::types::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 着手と評価値。評価値は手番側から見た値。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub pos: Position,
    pub score: i32,
}

impl Move {
    pub fn new(pos: Position, score: i32) -> Self {
        Move { pos, score }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}]", self.pos, self.score)
    }
}
