//! Game state and main loop.

use crate::broadcast::{self, BroadcastReport, Payload};
use crate::config::Config;
use crate::leaderboard;
use crate::simulation::{self, StepParams};
use crate::spawn::SpawnPolicy;
use crate::world::World;
use futures_util::FutureExt;
use protocol::{ClientMessage, ProtocolError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use super::session::{SessionId, SessionRegistry};

/// Ticks between periodic stats lines.
const STATS_EVERY_TICKS: u64 = 300;

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub eaten: usize,
    pub faults: usize,
    pub broadcast: BroadcastReport,
}

/// Main game state: the world plus everyone connected to it.
///
/// Shared as `Arc<RwLock<GameState>>`; input, connect, disconnect and the
/// whole tick body all run under the write lock.
pub struct GameState {
    pub config: Config,
    pub tick_count: u64,

    // Game world (entities)
    pub world: World,

    // Connected clients
    pub sessions: SessionRegistry,

    spawner: SpawnPolicy,
    rng: StdRng,
    params: StepParams,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    /// Create a new game state with the full food population in place.
    pub fn new(config: &Config) -> Self {
        let mut rng = match config.world.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut spawner = SpawnPolicy::new(config.world.map_size, config.world.food_colors);
        let mut world = World::new(config.world.map_size);
        for _ in 0..config.world.food_count {
            world.insert_food(spawner.new_food(&mut rng));
        }

        Self {
            config: config.clone(),
            tick_count: 0,
            world,
            sessions: SessionRegistry::new(),
            spawner,
            rng,
            params: StepParams::from(config),
            update_time_avg: 0.0,
        }
    }

    /// Open a session and spawn its player.
    pub fn connect(&mut self, addr: SocketAddr, outbox: mpsc::Sender<Payload>) -> SessionId {
        let player_id = self.spawner.next_id();
        let position = self.spawner.spawn_position(&mut self.rng);
        self.world.add_player(
            player_id,
            self.config.player.default_name.clone(),
            position,
            self.config.player.start_length,
        );
        let session_id = self.sessions.open(addr, player_id, outbox);
        info!("Client {} connected from {} as player {}", session_id, addr, player_id);
        session_id
    }

    /// Close a session and remove its player. Returns false if it was already gone.
    pub fn disconnect(&mut self, session_id: SessionId) -> bool {
        match self.sessions.close(session_id) {
            Some(session) => {
                self.world.remove_player(session.player_id);
                info!(
                    "Client {} ({}) disconnected, {} frames dropped",
                    session_id, session.addr, session.dropped_frames
                );
                true
            }
            None => false,
        }
    }

    /// Apply one inbound message.
    ///
    /// Unknown sessions and players are ignored. Malformed messages come
    /// back as errors for the caller to log; nothing is changed.
    pub fn handle_message(&mut self, session_id: SessionId, data: &[u8]) -> Result<(), ProtocolError> {
        let message = ClientMessage::parse(data, self.config.server.max_message_size)?;

        let Some(session) = self.sessions.get_mut(session_id) else {
            return Ok(());
        };
        session.touch();
        let player_id = session.player_id;

        match message {
            ClientMessage::Join { name } => {
                let name = self.sanitize_name(name);
                self.world.set_player_name(player_id, name);
            }
            ClientMessage::Input { angle, boosting } => {
                self.world.set_player_input(player_id, angle, boosting);
            }
        }
        Ok(())
    }

    /// Empty names fall back to the default; long names are cut.
    fn sanitize_name(&self, name: Option<String>) -> String {
        let name: String = name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .chars()
            .take(self.config.player.max_name_length)
            .collect();
        if name.is_empty() {
            self.config.player.default_name.clone()
        } else {
            name
        }
    }

    /// Run one simulation step and push the resulting snapshot to every session.
    pub fn tick(&mut self) -> TickSummary {
        self.tick_count += 1;

        let report = simulation::step(&mut self.world, &mut self.spawner, &mut self.rng, &self.params);

        let board = leaderboard::build(self.world.players(), self.config.leaderboard.size);
        let snapshot = broadcast::assemble(&self.world, board);
        let broadcast = match broadcast::encode(snapshot) {
            Ok(payload) => broadcast::broadcast(&payload, self.sessions.iter_mut()),
            Err(e) => {
                error!("Failed to encode snapshot for tick #{}: {}", self.tick_count, e);
                BroadcastReport::default()
            }
        };

        TickSummary {
            tick: self.tick_count,
            eaten: report.eaten.len(),
            faults: report.faults,
            broadcast,
        }
    }
}

/// Run the main game loop.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_rate: u32) {
    let tick_interval = Duration::from_secs_f64(1.0 / f64::from(tick_rate.max(1)));
    let start = Instant::now() + tick_interval;
    let mut ticker = interval_at(start, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    {
        let game = state.read().await;
        info!(
            "World initialized: {} food on a {}x{} map, {} ticks/s",
            game.world.food_count(),
            game.world.map_size(),
            game.world.map_size(),
            tick_rate
        );
    }

    loop {
        let scheduled = ticker.tick().await;

        // Drain any backlog of tick events so we always process the most recent tick.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        let mut game = state.write().await;
        let tick_start = std::time::Instant::now();
        let summary = game.tick();
        let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

        game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

        let tick_budget = tick_interval.as_secs_f64() * 1000.0 * 0.9;
        if tick_ms > tick_budget {
            warn!(
                "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} food",
                summary.tick,
                tick_ms,
                tick_budget,
                game.world.player_count(),
                game.world.food_count()
            );
        }

        if summary.tick % STATS_EVERY_TICKS == 0 {
            debug!(
                "Tick #{}: avg {:.2}ms | {} sessions, {} players | eaten={} faults={} delivered={} dropped={}",
                summary.tick,
                game.update_time_avg,
                game.sessions.len(),
                game.world.player_count(),
                summary.eaten,
                summary.faults,
                summary.broadcast.delivered,
                summary.broadcast.dropped
            );
        }
    }
}
