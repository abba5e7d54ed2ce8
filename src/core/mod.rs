pub mod board;
pub mod history;
pub mod r#move;
pub mod serialization;
pub mod types;

pub use board::Board;
pub use history::MoveHistory;
pub use r#move::Move;
pub use types::{EqualityMode, PlayerId, Position};
