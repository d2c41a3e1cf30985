//! Native worm arena server library.

pub mod broadcast;
pub mod config;
pub mod entity;
pub mod leaderboard;
pub mod server;
pub mod simulation;
pub mod spawn;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{GameState, run, serve};
