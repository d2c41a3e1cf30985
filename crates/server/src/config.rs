//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(Path::new("config.toml"))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, writing the defaults there if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// `PORT` from the environment wins over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring invalid PORT value {:?}", port),
            }
        }
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.tick_rate == 0 {
            anyhow::bail!("server.tick_rate must be greater than 0");
        }
        if self.server.outbox_capacity == 0 {
            anyhow::bail!("server.outbox_capacity must be greater than 0");
        }
        if !(self.world.map_size.is_finite() && self.world.map_size > 0.0) {
            anyhow::bail!("world.map_size must be a positive number, got {}", self.world.map_size);
        }
        if self.world.food_colors == 0 {
            anyhow::bail!("world.food_colors must be greater than 0");
        }
        if !(self.player.eat_radius.is_finite() && self.player.eat_radius > 0.0) {
            anyhow::bail!("player.eat_radius must be a positive number");
        }
        if !(self.player.growth.is_finite() && self.player.growth >= 0.0) {
            anyhow::bail!("player.growth must not be negative");
        }
        for (key, value) in [
            ("player.start_length", self.player.start_length),
            ("player.base_speed", self.player.base_speed),
            ("player.boost_extra", self.player.boost_extra),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{} must be a finite number", key);
            }
        }
        Ok(())
    }
}

/// Server networking and scheduling settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Simulation ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Snapshots buffered per session before frames start being dropped.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
    /// Largest inbound message in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            tick_rate: default_tick_rate(),
            outbox_capacity: default_outbox_capacity(),
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    200
}
fn default_ip_limit() -> usize {
    20
}
fn default_tick_rate() -> u32 {
    30
}
fn default_outbox_capacity() -> usize {
    8
}
fn default_max_message_size() -> usize {
    protocol::DEFAULT_MAX_MESSAGE_SIZE
}

/// World extent and food population.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorldConfig {
    /// Side length of the square toroidal map.
    #[serde(default = "default_map_size")]
    pub map_size: f64,
    /// Number of food pellets; constant for the world's lifetime.
    #[serde(default = "default_food_count")]
    pub food_count: usize,
    /// Food colors are drawn from `0..food_colors`.
    #[serde(default = "default_food_colors")]
    pub food_colors: u8,
    /// Fixed RNG seed. Unset means OS entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
            food_count: default_food_count(),
            food_colors: default_food_colors(),
            rng_seed: None,
        }
    }
}

fn default_map_size() -> f64 {
    4000.0
}
fn default_food_count() -> usize {
    500
}
fn default_food_colors() -> u8 {
    6
}

/// Player movement and growth.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_start_length")]
    pub start_length: f64,
    #[serde(default = "default_player_name")]
    pub default_name: String,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Distance travelled per tick.
    #[serde(default = "default_base_speed")]
    pub base_speed: f64,
    /// Added to `base_speed` while boosting.
    #[serde(default = "default_boost_extra")]
    pub boost_extra: f64,
    /// A food pellet closer than this to a player's head is eaten.
    #[serde(default = "default_eat_radius")]
    pub eat_radius: f64,
    /// Length gained per food pellet.
    #[serde(default = "default_growth")]
    pub growth: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_length: default_start_length(),
            default_name: default_player_name(),
            max_name_length: default_max_name_length(),
            base_speed: default_base_speed(),
            boost_extra: default_boost_extra(),
            eat_radius: default_eat_radius(),
            growth: default_growth(),
        }
    }
}

fn default_start_length() -> f64 {
    40.0
}
fn default_player_name() -> String {
    "Player".to_string()
}
fn default_max_name_length() -> usize {
    30
}
fn default_base_speed() -> f64 {
    3.0
}
fn default_boost_extra() -> f64 {
    2.0
}
fn default_eat_radius() -> f64 {
    20.0
}
fn default_growth() -> f64 {
    3.0
}

/// Leaderboard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeaderboardConfig {
    #[serde(default = "default_leaderboard_size")]
    pub size: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            size: default_leaderboard_size(),
        }
    }
}

fn default_leaderboard_size() -> usize {
    10
}
