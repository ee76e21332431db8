//! # Kill Book
//!
//! Every kill becomes an immutable [`KillRecord`]. The book keeps the full
//! list since the last reset (snapshots show its tail) and forwards each
//! record to the [`KillLog`] writer thread.
//!
//! ```text
//!   tick ──> KillBook::record ──> [bounded channel] ──> kill-log thread ──> kills.log
//!                  │                  (try_send)           (append / truncate)
//!                  └── Vec<KillRecord> (cleared on reset)
//! ```
//!
//! The tick never waits on the file: a full channel drops the line.

use crate::error::{SimError, SimResult};
use crossbeam_channel::{bounded, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Lines buffered between the tick and the writer thread.
const LOG_CHANNEL_CAPACITY: usize = 1024;

/// Killer id and name used when nobody in particular did it.
pub const GAME_KILLER_ID: &str = "game";
/// See [`GAME_KILLER_ID`].
pub const GAME_KILLER_NAME: &str = "Game";

/// One kill. Unique within a run by `(killer_id, victim_id, timestamp)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillRecord {
    /// Killer display name.
    pub killer: String,
    /// Killer actor id, or `"game"`.
    pub killer_id: String,
    /// Victim display name.
    pub victim: String,
    /// Victim actor id.
    pub victim_id: String,
    /// Server wall clock (ms).
    pub timestamp: u64,
}

impl KillRecord {
    /// De-duplication key.
    #[must_use]
    pub fn key(&self) -> (&str, &str, u64) {
        (&self.killer_id, &self.victim_id, self.timestamp)
    }
}

/// Ordered kill list with optional persistence.
#[derive(Debug)]
pub struct KillBook {
    kills: Vec<KillRecord>,
    last_timestamp: u64,
    log: Option<KillLog>,
    reset_every_ms: u64,
    next_reset_at: Option<u64>,
}

impl KillBook {
    /// Creates a book that clears itself every `reset_every_ms`.
    #[must_use]
    pub fn new(log: Option<KillLog>, reset_every_ms: u64) -> Self {
        Self {
            kills: Vec::new(),
            last_timestamp: 0,
            log,
            reset_every_ms: reset_every_ms.max(1),
            next_reset_at: None,
        }
    }

    /// Appends a kill. Timestamps are forced strictly increasing.
    pub fn record(&mut self, killer: &str, killer_id: &str, victim: &str, victim_id: &str, now_ms: u64) -> KillRecord {
        let timestamp = now_ms.max(self.last_timestamp + 1);
        self.last_timestamp = timestamp;
        let record = KillRecord {
            killer: killer.to_owned(),
            killer_id: killer_id.to_owned(),
            victim: victim.to_owned(),
            victim_id: victim_id.to_owned(),
            timestamp,
        };
        info!(killer, victim, timestamp, "kill");
        if let Some(log) = &self.log {
            log.append(&record);
        }
        self.kills.push(record.clone());
        record
    }

    /// Every kill since the last reset, oldest first.
    #[must_use]
    pub fn all(&self) -> &[KillRecord] {
        &self.kills
    }

    /// The newest `limit` kills, oldest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> &[KillRecord] {
        &self.kills[self.kills.len().saturating_sub(limit)..]
    }

    /// Kills since the last reset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kills.len()
    }

    /// `true` if nothing was recorded since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kills.is_empty()
    }

    /// Clears the list and truncates the log once the interval has passed.
    ///
    /// The first call only arms the timer. Returns `true` on reset.
    pub fn rotate_if_due(&mut self, now_ms: u64) -> bool {
        match self.next_reset_at {
            None => {
                self.next_reset_at = Some(now_ms + self.reset_every_ms);
                false
            }
            Some(due) if now_ms >= due => {
                self.kills.clear();
                if let Some(log) = &self.log {
                    log.reset();
                }
                self.next_reset_at = Some(now_ms + self.reset_every_ms);
                true
            }
            Some(_) => false,
        }
    }
}

#[derive(Debug)]
enum LogCommand {
    Append(String),
    Reset,
}

/// Append-only JSON-lines kill log written by a background thread.
#[derive(Debug)]
pub struct KillLog {
    path: PathBuf,
    sender: Option<Sender<LogCommand>>,
    writer: Option<JoinHandle<()>>,
}

impl KillLog {
    /// Truncates `path` and starts the writer thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the thread cannot
    /// be spawned.
    pub fn open(path: &Path) -> SimResult<Self> {
        let io_error = |source| SimError::KillLog {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(io_error)?;

        let (sender, receiver) = bounded(LOG_CHANNEL_CAPACITY);
        let thread_path = path.to_path_buf();
        let writer = thread::Builder::new()
            .name("kill-log".to_owned())
            .spawn(move || {
                let mut file = file;
                for command in receiver {
                    write_command(&mut file, &thread_path, command);
                }
            })
            .map_err(io_error)?;

        info!(path = %path.display(), "kill log opened");
        Ok(Self {
            path: path.to_path_buf(),
            sender: Some(sender),
            writer: Some(writer),
        })
    }

    /// File being written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queues one record. Never blocks.
    pub fn append(&self, record: &KillRecord) {
        match serde_json::to_string(record) {
            Ok(line) => self.send(LogCommand::Append(line)),
            Err(error) => warn!(%error, "failed to encode kill record"),
        }
    }

    /// Queues a truncation of the file.
    pub fn reset(&self) {
        self.send(LogCommand::Reset);
    }

    fn send(&self, command: LogCommand) {
        let Some(sender) = &self.sender else {
            return;
        };
        match sender.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!(path = %self.path.display(), "kill log backlog full, dropping entry"),
            Err(TrySendError::Disconnected(_)) => warn!(path = %self.path.display(), "kill log writer is gone"),
        }
    }
}

impl Drop for KillLog {
    fn drop(&mut self) {
        // Closing the channel ends the writer loop.
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                warn!(path = %self.path.display(), "kill log writer panicked");
            }
        }
    }
}

fn write_command(file: &mut File, path: &Path, command: LogCommand) {
    let result = match command {
        LogCommand::Append(line) => writeln!(file, "{line}").and_then(|()| file.flush()),
        LogCommand::Reset => file
            .set_len(0)
            .and_then(|()| file.seek(SeekFrom::Start(0)))
            .map(|_| info!(path = %path.display(), "kill log reset")),
    };
    if let Err(error) = result {
        warn!(path = %path.display(), %error, "kill log write failed");
    }
}
