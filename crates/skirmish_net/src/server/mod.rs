//! # Arena Server
//!
//! The authoritative game server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ARENA SERVER                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │ Connections  │   │ Sim loop     │   │ Broadcast    │      │
//! │  │ (tokio)      │   │ (60 Hz)      │   │ (30 Hz)      │      │
//! │  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘      │
//! │         └─────────────┬────┴──────────────────┘              │
//! │                ┌──────▼──────┐                               │
//! │                │ Mutex       │  one lock, never held         │
//! │                │ <NetSync>   │  across IO                    │
//! │                └─────────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Message handlers, simulation steps and snapshot captures all take the
//! same lock, so they never interleave. Encoding and socket writes happen
//! outside it.

mod connection;
mod hub;
mod tick;

pub use hub::{Channel, ConnectionId, Hub, Outbox};
pub use tick::{TickLoop, TickStats, MAX_CATCH_UP};

use crate::error::{NetError, NetResult};
use crate::session::NetSync;
use connection::{encode_line, serve_debug, serve_game, Shared};
use parking_lot::Mutex;
use skirmish_shared::unix_millis;
use skirmish_sim::{GameConfig, Simulation};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Seconds between tick statistics reports.
const STATS_INTERVAL_SECS: u64 = 10;

/// Addresses and rates, parsed from the game config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Game listener.
    pub bind: SocketAddr,
    /// Debug listener, if enabled.
    pub debug_bind: Option<SocketAddr>,
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// Snapshots per second.
    pub broadcast_rate: u32,
}

impl ServerConfig {
    /// Extracts the network section of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if an address does not parse.
    pub fn from_game(config: &GameConfig) -> NetResult<Self> {
        let network = &config.network;
        Ok(Self {
            bind: parse_addr(&network.bind)?,
            debug_bind: network.debug_bind.as_deref().map(parse_addr).transpose()?,
            tick_rate: network.tick_rate,
            broadcast_rate: network.broadcast_rate,
        })
    }
}

fn parse_addr(addr: &str) -> NetResult<SocketAddr> {
    addr.parse().map_err(|source| NetError::InvalidAddress {
        addr: addr.to_string(),
        source,
    })
}

/// Stops a running server from anywhere.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug, Default)]
struct ShutdownInner {
    stopped: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    /// Asks the server to stop.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// `true` once shutdown was requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    async fn stopped(&self) {
        let notified = self.inner.notify.notified();
        if self.is_stopped() {
            return;
        }
        notified.await;
    }
}

/// A bound, not yet running server.
pub struct ArenaServer {
    config: ServerConfig,
    shared: Shared,
    listener: TcpListener,
    debug_listener: Option<TcpListener>,
    shutdown: ShutdownHandle,
}

impl ArenaServer {
    /// Binds the listeners for `simulation`.
    ///
    /// # Errors
    ///
    /// Returns an error if an address is invalid or cannot be bound.
    pub async fn bind(simulation: Simulation) -> NetResult<Self> {
        let config = ServerConfig::from_game(simulation.config())?;
        let listener = TcpListener::bind(config.bind).await?;
        let debug_listener = match config.debug_bind {
            Some(addr) => Some(TcpListener::bind(addr).await?),
            None => None,
        };
        info!(
            addr = %listener.local_addr()?,
            debug = ?debug_listener.as_ref().and_then(|l| l.local_addr().ok()),
            tick_rate = config.tick_rate,
            broadcast_rate = config.broadcast_rate,
            "server bound"
        );
        Ok(Self {
            config,
            shared: Shared {
                sync: Arc::new(Mutex::new(NetSync::new(simulation))),
                hub: Arc::new(Hub::new()),
            },
            listener,
            debug_listener,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address the game listener is bound to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Address the debug listener is bound to, if enabled.
    #[must_use]
    pub fn debug_addr(&self) -> Option<SocketAddr> {
        self.debug_listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Handle that stops [`run`](Self::run).
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Shared game state.
    #[must_use]
    pub fn sync(&self) -> Arc<Mutex<NetSync>> {
        Arc::clone(&self.shared.sync)
    }

    /// Runs until Ctrl-C or [`ShutdownHandle::shutdown`].
    ///
    /// # Errors
    ///
    /// Returns an error if a pacing thread cannot be started.
    pub async fn run(self) -> NetResult<()> {
        let Self {
            config,
            shared,
            listener,
            debug_listener,
            shutdown,
        } = self;

        let loops = [
            spawn_simulation_loop(config.tick_rate, shared.clone(), shutdown.clone())?,
            spawn_broadcast_loop(config.broadcast_rate, shared.clone(), shutdown.clone())?,
        ];

        if let Some(debug_listener) = debug_listener {
            let (shared, shutdown) = (shared.clone(), shutdown.clone());
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        accepted = debug_listener.accept() => match accepted {
                            Ok((stream, peer)) => { tokio::spawn(serve_debug(stream, peer, shared.clone())); }
                            Err(error) => warn!(%error, "debug accept failed"),
                        },
                        () = shutdown.stopped() => break,
                    }
                }
            });
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => { tokio::spawn(serve_game(stream, peer, shared.clone())); }
                    Err(error) => warn!(%error, "accept failed"),
                },
                () = shutdown.stopped() => break,
                signal = tokio::signal::ctrl_c() => {
                    if let Err(error) = signal {
                        warn!(%error, "ctrl-c handler failed");
                    }
                    shutdown.shutdown();
                    break;
                }
            }
        }

        info!("shutting down");
        for handle in loops {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await;
            if !matches!(joined, Ok(Ok(()))) {
                warn!("pacing thread ended abnormally");
            }
        }
        Ok(())
    }
}

fn spawn_simulation_loop(rate: u32, shared: Shared, shutdown: ShutdownHandle) -> NetResult<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("simulation".into())
        .spawn(move || {
            let mut tick_loop = TickLoop::new(rate);
            let started = Instant::now();
            let report_every = u64::from(rate.max(1)) * STATS_INTERVAL_SECS;
            while !shutdown.is_stopped() {
                tick_loop.wait_for_next_tick();
                while tick_loop.should_tick() {
                    let start = tick_loop.begin_tick();
                    let report = shared.sync.lock().step(unix_millis());
                    tick_loop.end_tick(start);

                    if !report.kills.is_empty() {
                        debug!(tick = report.tick, kills = report.kills.len(), "kills this tick");
                    }
                    if tick_loop.tick_count() % report_every == 0 {
                        let stats = *tick_loop.stats();
                        info!(
                            uptime_secs = started.elapsed().as_secs(),
                            clients = shared.hub.count(Channel::Game),
                            avg_tick_us = stats.avg_tick_us,
                            min_tick_us = stats.min_tick_us,
                            max_tick_us = stats.max_tick_us,
                            late_percent = stats.late_percent(),
                            skipped = stats.skipped_ticks,
                            "tick stats"
                        );
                        tick_loop.reset_stats();
                    }
                }
            }
        })?;
    Ok(handle)
}

fn spawn_broadcast_loop(rate: u32, shared: Shared, shutdown: ShutdownHandle) -> NetResult<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("broadcast".into())
        .spawn(move || {
            let mut tick_loop = TickLoop::new(rate);
            while !shutdown.is_stopped() {
                tick_loop.wait_for_next_tick();
                while tick_loop.should_tick() {
                    let start = tick_loop.begin_tick();
                    let with_debug = shared.hub.count(Channel::Debug) > 0;
                    let (state, debug_state) = {
                        let mut sync = shared.sync.lock();
                        let now = unix_millis();
                        (sync.game_state(now), with_debug.then(|| sync.debug_state(now)))
                    };
                    if let Some(line) = encode_line(&state) {
                        shared.hub.broadcast(Channel::Game, &line);
                    }
                    if let Some(line) = debug_state.as_ref().and_then(encode_line) {
                        shared.hub.broadcast(Channel::Debug, &line);
                    }
                    tick_loop.end_tick(start);
                }
            }
        })?;
    Ok(handle)
}
