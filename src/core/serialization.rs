//! 棋譜文字列の読み書き
//!
//! 形式: `"<dimension>|<col>,<row>;<col>,<row>;..."`
//!
//! 区切りの `;` は手と手の間にのみ置く (先頭・末尾には置かない)。
//! 手が無い場合は `"<dimension>|"` となる。読み込み側も同じ規則で、
//! 空の区間 (先頭の `;` など) はエラーにする。

use super::board::Board;
use super::history::MoveHistory;
use super::types::{PlayerId, Position};
use crate::error::ParseError;

const SEPARATOR: char = '|';
const MOVE_SEPARATOR: char = ';';

/// 盤サイズと着手列を文字列にする
pub fn serialize_moves<I>(dimension: usize, moves: I) -> String
where
    I: IntoIterator<Item = Position>,
{
    let body: Vec<String> = moves
        .into_iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect();
    format!("{}{}{}", dimension, SEPARATOR, body.join(&MOVE_SEPARATOR.to_string()))
}

pub fn serialize_history(dimension: usize, history: &MoveHistory) -> String {
    serialize_moves(dimension, history.moves().iter().map(|(p, _)| *p))
}

/// 文字列を盤サイズと着手列に分解する (盤面の検証はしない)
pub fn parse_moves(s: &str) -> Result<(usize, Vec<Position>), ParseError> {
    let (dim_str, body) = s
        .split_once(SEPARATOR)
        .ok_or_else(|| ParseError::MissingSeparator(s.to_string()))?;
    let dimension: usize = dim_str
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidDimension(dim_str.to_string()))?;

    if body.is_empty() {
        return Ok((dimension, Vec::new()));
    }

    let moves = body
        .split(MOVE_SEPARATOR)
        .enumerate()
        .map(|(index, segment)| parse_coordinate(index, segment))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((dimension, moves))
}

fn parse_coordinate(index: usize, segment: &str) -> Result<Position, ParseError> {
    if segment.is_empty() {
        return Err(ParseError::EmptySegment { index });
    }
    let invalid = || ParseError::InvalidCoordinate {
        segment: segment.to_string(),
        index,
    };
    let (col, row) = segment.split_once(',').ok_or_else(invalid)?;
    let x = col.trim().parse().map_err(|_| invalid())?;
    let y = row.trim().parse().map_err(|_| invalid())?;
    Ok(Position::new(x, y))
}

/// 棋譜を再生して盤面・履歴・次の手番を復元する。先手から交互に置く。
pub fn load(s: &str) -> Result<(Board, MoveHistory, PlayerId), ParseError> {
    let (dimension, moves) = parse_moves(s)?;
    let mut board = Board::new(dimension)?;
    let mut history = MoveHistory::new();
    for (index, pos) in moves.into_iter().enumerate() {
        let player = PlayerId::for_ply(index);
        board
            .place(pos, player)
            .map_err(|source| ParseError::IllegalMove { index, source })?;
        history.push(pos, player);
    }
    let next = PlayerId::for_ply(history.len());
    Ok((board, history, next))
}
