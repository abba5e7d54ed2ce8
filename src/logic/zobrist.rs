use crate::core::{PlayerId, Position};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const PLAYERS: usize = 2;

/// Zobrist Hash用の乱数テーブル
///
/// 1マスにつき色ごとに1つずつ乱数を持つ。盤サイズごとに生成され、
/// 異なるサイズのテーブル同士のハッシュ値は比較できない。
#[derive(Debug)]
pub struct ZobristTable {
    dimension: usize,
    stones: Vec<[u64; PLAYERS]>,
    side_to_move: [u64; PLAYERS],
}

// 直近に要求された盤サイズのテーブル。サイズが変わったら作り直す。
static CURRENT_TABLE: Lazy<Mutex<Option<Arc<ZobristTable>>>> = Lazy::new(|| Mutex::new(None));

impl ZobristTable {
    fn generate<R: Rng>(dimension: usize, rng: &mut R) -> Self {
        let stones = (0..dimension * dimension)
            .map(|_| [rng.gen(), rng.gen()])
            .collect();
        ZobristTable {
            dimension,
            stones,
            side_to_move: [rng.gen(), rng.gen()],
        }
    }

    /// 指定サイズのテーブルを取得する。前回と同じサイズなら共有、違えば再生成。
    pub fn for_dimension(dimension: usize) -> Arc<ZobristTable> {
        Self::from_slot(&CURRENT_TABLE, dimension)
    }

    fn from_slot(slot: &Mutex<Option<Arc<ZobristTable>>>, dimension: usize) -> Arc<ZobristTable> {
        let mut current = slot.lock();
        if let Some(table) = current.as_ref() {
            if table.dimension == dimension {
                return Arc::clone(table);
            }
        }
        let table = Arc::new(Self::generate(dimension, &mut rand::thread_rng()));
        *current = Some(Arc::clone(&table));
        table
    }

    /// 再現性が必要な場面用 (テスト・自己対局)
    pub fn with_seed(dimension: usize, seed: u64) -> ZobristTable {
        Self::generate(dimension, &mut StdRng::seed_from_u64(seed))
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn stone(&self, pos: Position, player: PlayerId) -> u64 {
        self.stones[pos.y * self.dimension + pos.x][player.index()]
    }

    #[inline]
    pub fn side(&self, player: PlayerId) -> u64 {
        self.side_to_move[player.index()]
    }
}
