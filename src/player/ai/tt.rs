//! 置換表
//!
//! 盤面ハッシュ → 静的評価値、盤面ハッシュ → 候補手の順位付け。
//! 全探索スレッドで共有し、1つの Mutex で直列化する。
//!
//! `EqualityMode::Probabilistic` ではハッシュだけを信用するため、衝突時には
//! 別局面の値を返すことがある (既知の挙動であり補正しない)。`Strict` では
//! 盤面のスナップショットを一緒に保存し、取り出す時に照合する。

use crate::core::{Board, EqualityMode, Move, PlayerId};
use parking_lot::Mutex;
use std::collections::HashMap;

struct Entry<T> {
    value: T,
    snapshot: Option<Box<[Option<PlayerId>]>>,
}

#[derive(Default)]
struct Tables {
    heuristics: HashMap<u64, Entry<i32>>,
    rankings: HashMap<u64, Entry<Vec<Move>>>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub heuristics: usize,
    pub rankings: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct TranspositionCache {
    tables: Mutex<Tables>,
    mode: EqualityMode,
    capacity: usize,
}

impl TranspositionCache {
    pub fn new(mode: EqualityMode, capacity: usize) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            mode,
            capacity: capacity.max(1),
        }
    }

    pub fn mode(&self) -> EqualityMode {
        self.mode
    }

    fn snapshot(&self, board: &Board) -> Option<Box<[Option<PlayerId>]>> {
        match self.mode {
            EqualityMode::Strict => Some(board.cells().into()),
            EqualityMode::Probabilistic => None,
        }
    }

    fn matches<T>(entry: &Entry<T>, board: &Board) -> bool {
        match &entry.snapshot {
            Some(cells) => cells.as_ref() == board.cells(),
            None => true,
        }
    }

    pub fn get_heuristic(&self, board: &Board, player: PlayerId) -> Option<i32> {
        let mut tables = self.tables.lock();
        let found = tables
            .heuristics
            .get(&board.hash_for(player))
            .filter(|e| Self::matches(e, board))
            .map(|e| e.value);
        if found.is_some() {
            tables.hits += 1;
        } else {
            tables.misses += 1;
        }
        found
    }

    pub fn store_heuristic(&self, board: &Board, player: PlayerId, value: i32) {
        let snapshot = self.snapshot(board);
        let mut tables = self.tables.lock();
        if tables.heuristics.len() >= self.capacity {
            tables.heuristics.clear();
        }
        tables
            .heuristics
            .insert(board.hash_for(player), Entry { value, snapshot });
    }

    pub fn get_ranked(&self, board: &Board, player: PlayerId) -> Option<Vec<Move>> {
        let mut tables = self.tables.lock();
        let found = tables
            .rankings
            .get(&board.hash_for(player))
            .filter(|e| Self::matches(e, board))
            .map(|e| e.value.clone());
        if found.is_some() {
            tables.hits += 1;
        } else {
            tables.misses += 1;
        }
        found
    }

    pub fn store_ranked(&self, board: &Board, player: PlayerId, moves: Vec<Move>) {
        let snapshot = self.snapshot(board);
        let mut tables = self.tables.lock();
        if tables.rankings.len() >= self.capacity {
            tables.rankings.clear();
        }
        tables.rankings.insert(
            board.hash_for(player),
            Entry {
                value: moves,
                snapshot,
            },
        );
    }

    /// 対局終了・再開時に全消去する
    pub fn clear(&self) {
        let mut tables = self.tables.lock();
        tables.heuristics.clear();
        tables.rankings.clear();
        tables.hits = 0;
        tables.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let tables = self.tables.lock();
        CacheStats {
            heuristics: tables.heuristics.len(),
            rankings: tables.rankings.len(),
            hits: tables.hits,
            misses: tables.misses,
        }
    }
}
