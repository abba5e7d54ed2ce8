use clap::{Parser, Subcommand};
use gomoku_aho_ai::core::PlayerId;
use gomoku_aho_ai::game::Game;
use gomoku_aho_ai::player::ai::{AIConfig, Algorithm, Engine};
use gomoku_aho_ai::selfplay::{run_selfplay, SelfPlayConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gomoku-aho-ai", version, about = "Gomoku (five in a row) engine")]
struct Cli {
    /// AI config file (defaults to ./ai_config.json, or built-in defaults)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the engine's move for a game record such as "15|7,7;8,8"
    Move {
        record: String,
        /// Override the configured algorithm
        #[arg(short, long, value_parser = parse_algorithm)]
        algorithm: Option<Algorithm>,
    },
    /// Play engine-vs-engine games in parallel and print the results as JSON
    Selfplay {
        #[arg(short = 'n', long, default_value_t = 4)]
        games: usize,
        #[arg(short, long, default_value_t = 15)]
        dimension: usize,
        /// Config for the second player (defaults to the first player's)
        #[arg(long, value_name = "FILE")]
        opponent: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown algorithm '{}'", s))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AIConfig> {
    match path {
        Some(p) => AIConfig::load_from(p),
        None => Ok(AIConfig::load_or_default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.cmd {
        Command::Move { record, algorithm } => {
            let mut config = config;
            if let Some(algorithm) = algorithm {
                config.algorithm = algorithm;
            }
            let game = Game::from_record(&record)?;
            if game.is_over() {
                println!("game over: {:?}", game.status());
                return Ok(());
            }
            let engine = Engine::new(config)?;
            let player = game.current_player();
            match engine.request_move(game.board(), player) {
                Some(mv) => println!(
                    "{} {},{}",
                    match player {
                        PlayerId::Player1 => "P1",
                        PlayerId::Player2 => "P2",
                    },
                    mv.pos.x,
                    mv.pos.y
                ),
                None => println!("no move"),
            }
        }
        Command::Selfplay {
            games,
            dimension,
            opponent,
            seed,
        } => {
            let ai2 = match opponent {
                Some(p) => AIConfig::load_from(p)?,
                None => config.clone(),
            };
            let results = run_selfplay(&SelfPlayConfig {
                num_games: games,
                dimension,
                ai1: config,
                ai2,
                max_moves: dimension * dimension,
                seed,
            })?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }
    Ok(())
}
