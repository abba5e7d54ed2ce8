//! 五目並べの思考エンジン
//!
//! 盤面 (`core`)、候補手とハッシュ (`logic`)、評価と探索 (`player::ai`)、
//! 対局の進行 (`game`)、自己対局 (`selfplay`) からなる。

pub mod core;
pub mod error;
pub mod game;
pub mod logic;
pub mod player;
pub mod selfplay;
