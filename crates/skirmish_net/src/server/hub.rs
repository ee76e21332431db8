//! # Connection Hub
//!
//! Registry of connected clients' outboxes. Every connection has a writer
//! task draining a bounded channel. Sending never blocks the caller: a full
//! outbox loses the line (the next snapshot supersedes it) and a vanished
//! client is dropped from the registry on the next send.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tracing::debug;

/// Lines buffered per connection before new ones are dropped.
pub const OUTBOX_CAPACITY: usize = 256;

/// Encoded message lines queued for one connection.
pub type Outbox = Sender<Arc<str>>;

/// Queues `line` without waiting. Returns `false` once the writer is gone.
pub fn offer(outbox: &Outbox, line: Arc<str>) -> bool {
    match outbox.try_send(line) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            debug!("outbox full, line dropped");
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// Which listener a connection came in on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Players.
    Game,
    /// Debug viewers.
    Debug,
}

/// Unique id of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// All live outboxes, per channel.
#[derive(Debug, Default)]
pub struct Hub {
    next_id: AtomicU64,
    game: Mutex<HashMap<ConnectionId, Outbox>>,
    debug: Mutex<HashMap<ConnectionId, Outbox>>,
}

impl Hub {
    /// Empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self, channel: Channel) -> &Mutex<HashMap<ConnectionId, Outbox>> {
        match channel {
            Channel::Game => &self.game,
            Channel::Debug => &self.debug,
        }
    }

    /// Adds an outbox and returns its id.
    pub fn register(&self, channel: Channel, outbox: Outbox) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.clients(channel).lock().insert(id, outbox);
        id
    }

    /// Removes an outbox.
    pub fn unregister(&self, channel: Channel, id: ConnectionId) {
        self.clients(channel).lock().remove(&id);
    }

    /// Connections on `channel`.
    #[must_use]
    pub fn count(&self, channel: Channel) -> usize {
        self.clients(channel).lock().len()
    }

    /// Offers `line` to every connection on `channel`; returns how many
    /// are still connected.
    pub fn broadcast(&self, channel: Channel, line: &Arc<str>) -> usize {
        let mut clients = self.clients(channel).lock();
        clients.retain(|_, outbox| offer(outbox, Arc::clone(line)));
        clients.len()
    }
}
