//! Game server implementation.

use crate::broadcast::Payload;
use crate::config::Config;
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod game;
pub mod session;

pub use game::{GameState, TickSummary, run_game_loop};
pub use session::{SessionId, SessionRegistry};

/// Connection tracking state.
struct ConnectionState {
    /// Number of connections per IP address.
    ip_connections: HashMap<IpAddr, usize>,
    /// Total number of connections.
    total_connections: usize,
}

impl ConnectionState {
    fn new() -> Self {
        Self {
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Try to add a connection, returns true if allowed.
    fn try_add_connection(&mut self, ip: IpAddr, max_total: usize, max_per_ip: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }

        let current = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if current >= max_per_ip {
            return false;
        }

        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        true
    }

    /// Remove a connection.
    fn remove_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            if *count > 0 {
                *count -= 1;
                self.total_connections = self.total_connections.saturating_sub(1);
            }
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
    }
}

/// Run the game server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, config).await
}

/// Serve on an already bound listener. Only returns on an accept error.
pub async fn serve(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    info!("Listening on ws://{}", listener.local_addr()?);

    let conn_state = Arc::new(RwLock::new(ConnectionState::new()));
    let game_state = Arc::new(RwLock::new(GameState::new(&config)));

    // Start the game loop
    let game_loop_state = Arc::clone(&game_state);
    let tick_rate = config.server.tick_rate;
    tokio::spawn(async move {
        game::run_game_loop(game_loop_state, tick_rate).await;
    });

    // Connection limits
    let max_connections = config.server.max_connections;
    let ip_limit = config.server.ip_limit;
    let outbox_capacity = config.server.outbox_capacity;

    loop {
        let (stream, addr) = listener.accept().await?;
        let ip = addr.ip();

        {
            let mut state = conn_state.write().await;
            if !state.try_add_connection(ip, max_connections, ip_limit) {
                warn!("Connection rejected (limit reached): {}", addr);
                continue;
            }
        }

        let game_state = Arc::clone(&game_state);
        let conn_state = Arc::clone(&conn_state);

        tokio::spawn(async move {
            let result = handle_connection(stream, addr, game_state, outbox_capacity).await;

            // Always remove from connection tracking when done
            {
                let mut state = conn_state.write().await;
                state.remove_connection(addr.ip());
            }

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    game_state: Arc<RwLock<GameState>>,
    outbox_capacity: usize,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<Payload>(outbox_capacity.max(1));

    let session_id = {
        let mut state = game_state.write().await;
        state.connect(addr, outbox_tx)
    };

    // Message loop - handle both incoming messages and queued snapshots
    let result = loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_inbound(&game_state, session_id, addr, text.as_bytes()).await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        handle_inbound(&game_state, session_id, addr, &data).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("Client {} sent close", addr);
                        break Ok(());
                    }
                    Some(Err(e)) => {
                        break Err(anyhow::Error::from(e));
                    }
                    None => {
                        break Ok(());
                    }
                    _ => {}
                }
            }
            payload = outbox_rx.recv() => {
                match payload {
                    Some(payload) => {
                        if let Err(e) = write.send(Message::Text(payload)).await {
                            warn!("Failed to send snapshot to {}: {}", addr, e);
                            break Ok(());
                        }
                    }
                    None => break Ok(()),
                }
            }
        }
    };

    {
        let mut state = game_state.write().await;
        state.disconnect(session_id);
    }

    result
}

/// Apply one inbound frame. Bad frames are logged and otherwise ignored.
async fn handle_inbound(game_state: &RwLock<GameState>, session_id: SessionId, addr: SocketAddr, data: &[u8]) {
    let mut state = game_state.write().await;
    if let Err(e) = state.handle_message(session_id, data) {
        debug!("Ignoring message from {}: {}", addr, e);
    }
}
