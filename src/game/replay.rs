use crate::core::serialization::{parse_moves, serialize_moves};
use crate::core::{Board, PlayerId, Position};
use crate::error::ParseError;
use crate::game::Game;

/// 棋譜の再生。各手数の盤面をあらかじめ計算しておく。
pub struct Replay {
    moves: Vec<Position>,
    boards: Vec<Board>,
    current_index: usize,
}

impl Replay {
    pub fn from_record(record: &str) -> Result<Self, ParseError> {
        let (dimension, moves) = parse_moves(record)?;
        let mut board = Board::new(dimension)?;
        let mut boards = Vec::with_capacity(moves.len() + 1);
        boards.push(board.clone());
        for (index, &pos) in moves.iter().enumerate() {
            board
                .place(pos, PlayerId::for_ply(index))
                .map_err(|source| ParseError::IllegalMove { index, source })?;
            boards.push(board.clone());
        }
        Ok(Replay {
            moves,
            boards,
            current_index: 0,
        })
    }

    pub fn from_game(game: &Game) -> Self {
        let moves: Vec<Position> = game.history().moves().iter().map(|(p, _)| *p).collect();
        let mut board = Board::with_table(game.board().zobrist().clone());
        let mut boards = vec![board.clone()];
        for (pos, player) in game.history().moves() {
            // 対局中に検証済みの手
            if board.place(*pos, *player).is_ok() {
                boards.push(board.clone());
            }
        }
        Replay {
            moves,
            boards,
            current_index: 0,
        }
    }

    /// 手数 (初期局面を含まない)
    pub fn len(&self) -> usize {
        self.boards.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn board(&self) -> &Board {
        &self.boards[self.current_index]
    }

    pub fn last_move(&self) -> Option<(Position, PlayerId)> {
        let index = self.current_index.checked_sub(1)?;
        Some((self.moves[index], PlayerId::for_ply(index)))
    }

    pub fn next(&mut self) -> bool {
        if self.current_index < self.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.current_index > 0 {
            self.current_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn jump(&mut self, index: usize) {
        self.current_index = index.min(self.len());
    }

    /// 現在の手数までの棋譜
    pub fn record(&self) -> String {
        serialize_moves(
            self.board().dimension(),
            self.moves[..self.current_index].iter().copied(),
        )
    }
}
