//! 対局の進行
//!
//! 正式な盤面・履歴・手番・勝敗を持つ。探索は常に盤面の複製で行うので、
//! ここでの盤面は対局の操作 (着手・待った・やり直し・再開) でしか変わらない。

pub mod replay;

use crate::core::serialization::{load, serialize_history};
use crate::core::{Board, Move, MoveHistory, PlayerId, Position};
use crate::error::{BoardError, MoveError, ParseError};
use crate::player::ai::TranspositionCache;
use crate::player::PlayerController;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    InProgress,
    Won(PlayerId),
    Draw,
}

pub struct Game {
    board: Board,
    history: MoveHistory,
    current_player: PlayerId,
    status: GameStatus,
    // 対局の終了・再開時に消去する置換表
    caches: Vec<Arc<TranspositionCache>>,
}

impl Game {
    pub fn new(dimension: usize) -> Result<Self, BoardError> {
        Ok(Game {
            board: Board::new(dimension)?,
            history: MoveHistory::new(),
            current_player: PlayerId::Player1,
            status: GameStatus::InProgress,
            caches: Vec::new(),
        })
    }

    /// 棋譜文字列から対局を復元する
    pub fn from_record(record: &str) -> Result<Self, ParseError> {
        let (board, history, next) = load(record)?;
        let status = Self::status_of(&board, history.last().map(|(p, _)| p));
        Ok(Game {
            board,
            history,
            current_player: next,
            status,
            caches: Vec::new(),
        })
    }

    pub fn attach_cache(&mut self, cache: Arc<TranspositionCache>) {
        self.caches.push(cache);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.status {
            GameStatus::Won(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    pub fn record(&self) -> String {
        serialize_history(self.board.dimension(), &self.history)
    }

    fn status_of(board: &Board, last: Option<Position>) -> GameStatus {
        if let Some(pos) = last {
            if let Some(player) = board.get(pos).filter(|_| board.is_five_at(pos)) {
                return GameStatus::Won(player);
            }
        }
        if board.is_full() {
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        }
    }

    fn finish(&mut self) {
        for cache in &self.caches {
            cache.clear();
        }
        log::info!(
            "game over: {:?} after {} moves ({})",
            self.status,
            self.history.len(),
            self.record()
        );
    }

    /// 手番側の石を置く。不正な手は盤面を変えずに拒否する。
    pub fn place(&mut self, pos: Position) -> Result<GameStatus, MoveError> {
        if self.is_over() {
            return Err(MoveError::GameOver);
        }
        let player = self.current_player;
        self.board.place(pos, player)?;
        self.history.push(pos, player);
        self.current_player = player.opponent();
        self.status = Self::status_of(&self.board, Some(pos));
        if self.is_over() {
            self.finish();
        }
        Ok(self.status)
    }

    /// 直前の手を取り消す。取り消した手番がそのまま次の手番になる。
    pub fn undo(&mut self) -> Result<Position, MoveError> {
        let (pos, player) = self.history.undo().ok_or(MoveError::NothingToUndo)?;
        if let Err(e) = self.board.undo(pos) {
            self.history.redo();
            return Err(e);
        }
        self.current_player = player;
        self.status = GameStatus::InProgress;
        Ok(pos)
    }

    pub fn redo(&mut self) -> Result<Position, MoveError> {
        let (pos, player) = self.history.redo().ok_or(MoveError::NothingToRedo)?;
        if let Err(e) = self.board.place(pos, player) {
            self.history.undo();
            return Err(e);
        }
        self.current_player = player.opponent();
        self.status = Self::status_of(&self.board, Some(pos));
        if self.is_over() {
            self.finish();
        }
        Ok(pos)
    }

    /// 新しい盤で最初からやり直す。盤サイズが変わるとハッシュ表も作り直される。
    pub fn restart(&mut self, dimension: usize) -> Result<(), BoardError> {
        self.board = Board::new(dimension)?;
        self.history.clear();
        self.current_player = PlayerId::Player1;
        self.status = GameStatus::InProgress;
        for cache in &self.caches {
            cache.clear();
        }
        Ok(())
    }

    /// 決着がつくか `max_moves` 手に達するまで指し合う
    pub fn play<F>(
        &mut self,
        p1: &dyn PlayerController,
        p2: &dyn PlayerController,
        max_moves: usize,
        mut on_move: F,
    ) -> GameStatus
    where
        F: FnMut(PlayerId, &Move),
    {
        while !self.is_over() && self.history.len() < max_moves {
            let player = self.current_player;
            let controller = match player {
                PlayerId::Player1 => p1,
                PlayerId::Player2 => p2,
            };
            let Some(mv) = controller.choose_move(&self.board, player) else {
                log::warn!("{} ({:?}) has no move", controller.name(), player);
                break;
            };
            if let Err(e) = self.place(mv.pos) {
                log::warn!("{} ({:?}) chose an illegal move: {}", controller.name(), player, e);
                break;
            }
            on_move(player, &mv);
        }
        if !self.is_over() {
            self.status = GameStatus::Draw;
            self.finish();
        }
        p1.game_over();
        p2.game_over();
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EqualityMode;

    #[test]
    fn test_place_alternates_and_rejects_illegal() {
        let mut game = Game::new(9).unwrap();
        assert_eq!(game.place(Position::new(4, 4)), Ok(GameStatus::InProgress));
        assert_eq!(game.current_player(), PlayerId::Player2);
        assert_eq!(
            game.place(Position::new(4, 4)),
            Err(MoveError::Occupied {
                position: Position::new(4, 4)
            })
        );
        assert!(matches!(
            game.place(Position::new(9, 0)),
            Err(MoveError::OutOfBounds { .. })
        ));
        assert_eq!(game.current_player(), PlayerId::Player2);
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_win_clears_cache_and_blocks_moves() {
        let mut game = Game::new(9).unwrap();
        let cache = Arc::new(TranspositionCache::new(EqualityMode::Probabilistic, 16));
        cache.store_heuristic(game.board(), PlayerId::Player1, 1);
        game.attach_cache(cache.clone());
        for x in 0..4 {
            game.place(Position::new(x, 0)).unwrap();
            game.place(Position::new(x, 8)).unwrap();
        }
        assert_eq!(cache.stats().heuristics, 1);
        assert_eq!(
            game.place(Position::new(4, 0)),
            Ok(GameStatus::Won(PlayerId::Player1))
        );
        assert_eq!(game.winner(), Some(PlayerId::Player1));
        assert_eq!(cache.stats().heuristics, 0);
        assert_eq!(game.place(Position::new(5, 5)), Err(MoveError::GameOver));

        // 待ったで対局に戻れる
        assert_eq!(game.undo(), Ok(Position::new(4, 0)));
        assert_eq!(game.status(), GameStatus::InProgress);
        assert_eq!(game.current_player(), PlayerId::Player1);
        assert_eq!(game.redo(), Ok(Position::new(4, 0)));
        assert_eq!(game.winner(), Some(PlayerId::Player1));
    }

    #[test]
    fn test_undo_redo_restore_hash() {
        let mut game = Game::new(15).unwrap();
        let start = game.board().hash();
        game.place(Position::new(7, 7)).unwrap();
        game.place(Position::new(8, 8)).unwrap();
        let mid = game.board().hash();
        game.undo().unwrap();
        game.undo().unwrap();
        assert_eq!(game.board().hash(), start);
        assert_eq!(game.undo(), Err(MoveError::NothingToUndo));
        game.redo().unwrap();
        game.redo().unwrap();
        assert_eq!(game.board().hash(), mid);
        assert_eq!(game.redo(), Err(MoveError::NothingToRedo));

        // 新しい手で redo は消える
        game.undo().unwrap();
        game.place(Position::new(0, 0)).unwrap();
        assert_eq!(game.redo(), Err(MoveError::NothingToRedo));
    }

    #[test]
    fn test_record_round_trip() {
        let mut game = Game::new(15).unwrap();
        for (x, y) in [(7, 7), (7, 8), (8, 7), (6, 6)] {
            game.place(Position::new(x, y)).unwrap();
        }
        let record = game.record();
        assert_eq!(record, "15|7,7;7,8;8,7;6,6");
        let restored = Game::from_record(&record).unwrap();
        assert!(restored
            .board()
            .same_position(game.board(), EqualityMode::Strict));
        assert_eq!(restored.current_player(), game.current_player());
        assert_eq!(restored.status(), GameStatus::InProgress);
    }

    #[test]
    fn test_restart() {
        let mut game = Game::new(15).unwrap();
        game.place(Position::new(7, 7)).unwrap();
        game.restart(19).unwrap();
        assert_eq!(game.board().dimension(), 19);
        assert!(game.history().is_empty());
        assert_eq!(game.current_player(), PlayerId::Player1);
        assert!(game.restart(0).is_err());
    }
}
