//! エンジン同士の自己対局
//!
//! 各対局は独立した `Game` とエンジンで行い、rayon で並列に回す。

use crate::core::PlayerId;
use crate::game::{Game, GameStatus};
use crate::player::ai::{AIConfig, Engine};
use crate::player::{AIController, PlayerController};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub struct SelfPlayConfig {
    pub num_games: usize,
    pub dimension: usize,
    pub ai1: AIConfig,
    pub ai2: AIConfig,
    /// この手数で引き分けとする
    pub max_moves: usize,
    /// 指定すると対局ごとに `seed + 対局番号` で乱数を固定する
    pub seed: Option<u64>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 1,
            dimension: 15,
            ai1: AIConfig::default(),
            ai2: AIConfig::default(),
            max_moves: 225,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Option<PlayerId>,
    pub moves: usize,
    pub time_ms: u128,
    /// 棋譜 (`"<dimension>|<col>,<row>;..."`)
    pub record: String,
}

fn engine(config: &AIConfig, seed: Option<u64>) -> anyhow::Result<Engine> {
    let engine = Engine::new(config.clone())?;
    Ok(match seed {
        Some(seed) => engine.with_seed(seed),
        None => engine,
    })
}

pub fn play_one(config: &SelfPlayConfig, game_num: usize) -> anyhow::Result<GameResult> {
    let start_time = Instant::now();
    let seed = config.seed.map(|s| s.wrapping_add(game_num as u64));
    let e1 = engine(&config.ai1, seed)?;
    let e2 = engine(&config.ai2, seed.map(|s| s ^ 0x5eed))?;

    let mut game = Game::new(config.dimension)?;
    game.attach_cache(e1.cache().clone());
    game.attach_cache(e2.cache().clone());
    let p1 = AIController::new("AI-P1", e1);
    let p2 = AIController::new("AI-P2", e2);

    let status = game.play(&p1, &p2, config.max_moves, |player, mv| {
        log::debug!("game {}: {:?} {}", game_num, player, mv);
    });

    let result = GameResult {
        winner: match status {
            GameStatus::Won(p) => Some(p),
            _ => None,
        },
        moves: game.history().len(),
        time_ms: start_time.elapsed().as_millis(),
        record: game.record(),
    };
    log::info!(
        "game {}: {} vs {} -> {:?} in {} moves",
        game_num,
        p1.name(),
        p2.name(),
        result.winner,
        result.moves
    );
    Ok(result)
}

/// `num_games` 局を並列に指し、対局番号順に結果を返す
pub fn run_selfplay(config: &SelfPlayConfig) -> anyhow::Result<Vec<GameResult>> {
    (1..=config.num_games)
        .into_par_iter()
        .map(|game_num| play_one(config, game_num))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Game;
    use crate::player::ai::Algorithm;

    fn quick(algorithm: Algorithm) -> AIConfig {
        AIConfig {
            algorithm,
            depth: 1,
            breadth: 4,
            iterative_deepening: false,
            time_limit_seconds: 5.0,
            ..AIConfig::default()
        }
    }

    #[test]
    fn test_parallel_games_produce_valid_records() {
        let config = SelfPlayConfig {
            num_games: 3,
            dimension: 9,
            ai1: quick(Algorithm::Heuristic),
            ai2: quick(Algorithm::ZeroSum),
            max_moves: 81,
            seed: Some(1),
        };
        let results = run_selfplay(&config).unwrap();
        assert_eq!(results.len(), 3);
        for result in results {
            let game = Game::from_record(&result.record).unwrap();
            assert_eq!(game.history().len(), result.moves);
            assert_eq!(game.winner(), result.winner);
            assert!(result.moves <= 81);
        }
    }

    #[test]
    fn test_invalid_config_is_error() {
        let config = SelfPlayConfig {
            ai1: AIConfig {
                depth: 0,
                ..AIConfig::default()
            },
            ..SelfPlayConfig::default()
        };
        assert!(run_selfplay(&config).is_err());
    }
}
