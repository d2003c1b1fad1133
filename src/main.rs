use std::path::PathBuf;
use std::time::Duration;

use anytime_2048::config;
use anytime_2048::engine::{self, Board};
use anytime_2048::game::Game;
use anytime_2048::search::{Agent, MovePicker, SearchConfig, Strategy};
use clap::{Parser, ValueEnum};
use log::info;
use rand::{rngs::StdRng, SeedableRng};

#[derive(Parser, Debug)]
#[command(name = "anytime-2048", version, about = "Play one game of 2048 with a time-budgeted search")]
struct Args {
    /// TOML file with search settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the configured strategy
    #[arg(short, long, value_enum)]
    strategy: Option<StrategyArg>,
    /// Time budget per move in milliseconds
    #[arg(short, long, default_value_t = 50)]
    time_ms: u64,
    /// RNG seed for tile spawns
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Stop after this many moves
    #[arg(long)]
    max_moves: Option<u64>,
    /// Print the board after every move
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Adversarial,
    Stochastic,
}

impl From<StrategyArg> for Strategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Adversarial => Strategy::Adversarial,
            StrategyArg::Stochastic => Strategy::Stochastic,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => SearchConfig::default(),
    };
    if let Some(s) = args.strategy {
        let strategy = Strategy::from(s);
        if args.config.is_none() {
            cfg = SearchConfig::for_strategy(strategy);
        } else {
            cfg.strategy = strategy;
        }
    }
    engine::warm();
    let mut agent: Agent<Board> = Agent::new(cfg)?;
    info!("searching with {:?}", agent.config());
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut board = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    let limit = Duration::from_millis(args.time_ms);
    let mut move_count = 0u64;

    while !board.is_terminal() && args.max_moves.map_or(true, |max| move_count < max) {
        let Some(dir) = agent.find_move(&board, limit) else { break };
        board = board.play(dir, &mut rng);
        move_count += 1;
        if args.verbose {
            println!("{dir}\n{board}");
        }
    }

    let stats = agent.stats();
    println!("{board}");
    println!(
        "Moves made: {}, score: {}, highest tile: {}",
        move_count,
        board.score(),
        board.highest_tile()
    );
    println!("Average depth: {:.2}", stats.average_completed_depth());
    println!("Branching factor: {:.2}", stats.average_branching_factor());
    Ok(())
}
