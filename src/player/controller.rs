use crate::core::{Board, Move, PlayerId};
use crate::player::ai::Engine;

/// プレイヤー操作のtrait
pub trait PlayerController: Send + Sync {
    fn choose_move(&self, board: &Board, player: PlayerId) -> Option<Move>;
    fn name(&self) -> &str;
    /// 対局が終わったときに呼ばれる
    fn game_over(&self) {}
}

/// 思考エンジンで指すプレイヤー
pub struct AIController {
    name: String,
    engine: Engine,
}

impl AIController {
    pub fn new(name: &str, engine: Engine) -> Self {
        AIController {
            name: name.to_string(),
            engine,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl PlayerController for AIController {
    fn choose_move(&self, board: &Board, player: PlayerId) -> Option<Move> {
        self.engine.request_move(board, player)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn game_over(&self) {
        self.engine.clear_cache();
    }
}
