//! anytime-2048: time-budgeted move search for 2048
//!
//! This crate provides:
//! - A `Game` trait describing the board the search consumes (`game` module)
//! - A compact packed `Board` implementing it (`engine` module)
//! - Iterative-deepening alpha-beta / expectimax search that always has a move
//!   ready before the deadline (`search` module)
//! - TOML loading of search and heuristic settings (`config` module)
//!
//! Full loop (simplest possible)
//! ```
//! use anytime_2048::engine::Board;
//! use anytime_2048::game::Game;
//! use anytime_2048::search::{Agent, MovePicker, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::time::Duration;
//!
//! let mut agent: Agent<Board> = Agent::new(SearchConfig::default())?;
//! let mut rng = StdRng::seed_from_u64(123);
//! let mut b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let mut moves = 0u32;
//!
//! // Keep doctests fast: a few moves with a tiny budget.
//! while !b.is_terminal() && moves < 4 {
//!     match agent.find_move(&b, Duration::from_millis(5)) {
//!         Some(dir) => b = b.play(dir, &mut rng),
//!         None => break,
//!     }
//!     moves += 1;
//! }
//! assert!(moves > 0);
//! # Ok::<(), anytime_2048::error::ConfigError>(())
//! ```
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod search;
