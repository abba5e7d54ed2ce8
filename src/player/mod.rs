pub mod ai;
pub mod controller;

pub use ai::{AIConfig, Engine};
pub use controller::{AIController, PlayerController};
