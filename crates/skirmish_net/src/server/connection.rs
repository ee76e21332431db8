//! # Connection Handling
//!
//! One task per TCP connection reads newline-delimited JSON; a second task
//! writes queued lines back. Bad input is dropped without closing the
//! connection; EOF or a read error ends the session and removes the actor.

use super::hub::{offer, Channel, ConnectionId, Hub, Outbox, OUTBOX_CAPACITY};
use crate::protocol::{decode, encode, ClientMessage, DebugCommand, Envelope};
use crate::session::{NetSync, Outcome, Session};
use parking_lot::Mutex;
use serde::Serialize;
use skirmish_shared::unix_millis;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, Receiver};
use tracing::{debug, info, warn};

/// Shared state every connection task needs.
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) sync: Arc<Mutex<NetSync>>,
    pub(crate) hub: Arc<Hub>,
}

/// Encodes `message`, logging instead of failing.
pub(crate) fn encode_line<T: Serialize>(message: &T) -> Option<Arc<str>> {
    match encode(message) {
        Ok(text) => Some(Arc::from(text)),
        Err(error) => {
            warn!(%error, "failed to encode message");
            None
        }
    }
}

fn queue(outbox: &Outbox, envelope: &Envelope) {
    if let Some(line) = encode_line(envelope) {
        // A closed outbox means the writer is gone; the reader will notice.
        offer(outbox, line);
    }
}

fn dispatch(shared: &Shared, outbox: &Outbox, outcome: Outcome) {
    match outcome {
        Outcome::Reply(envelope) => queue(outbox, &envelope),
        Outcome::Broadcast(envelope) => {
            if let Some(line) = encode_line(&envelope) {
                shared.hub.broadcast(Channel::Game, &line);
            }
        }
        Outcome::Applied | Outcome::Ignored(_) => {}
    }
}

async fn write_lines(mut writer: OwnedWriteHalf, mut outbox: Receiver<Arc<str>>, peer: SocketAddr) {
    while let Some(line) = outbox.recv().await {
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await
        }
        .await;
        if let Err(error) = written {
            debug!(%peer, %error, "write failed");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

/// Spawns the writer and registers the connection.
fn open(shared: &Shared, channel: Channel, writer: OwnedWriteHalf, peer: SocketAddr) -> (ConnectionId, Outbox) {
    let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
    tokio::spawn(write_lines(writer, rx, peer));
    let id = shared.hub.register(channel, tx.clone());
    (id, tx)
}

/// Serves one game client until it disconnects.
pub(crate) async fn serve_game(stream: TcpStream, peer: SocketAddr, shared: Shared) {
    let _ = stream.set_nodelay(true);
    let (reader, writer) = stream.into_split();
    let (id, outbox) = open(&shared, Channel::Game, writer, peer);
    info!(%peer, clients = shared.hub.count(Channel::Game), "client connected");

    let mut session = Session::new();
    let hello = shared.sync.lock().hello(unix_millis());
    queue(&outbox, &hello);

    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match decode::<ClientMessage>(&line) {
                Ok(message) => {
                    let outcome = shared.sync.lock().handle(&mut session, message, unix_millis());
                    dispatch(&shared, &outbox, outcome);
                }
                Err(error) => debug!(%peer, %error, "dropped malformed message"),
            },
            Ok(None) => break,
            Err(error) => {
                debug!(%peer, %error, "read failed");
                break;
            }
        }
    }

    shared.hub.unregister(Channel::Game, id);
    shared.sync.lock().disconnect(&mut session);
    info!(%peer, clients = shared.hub.count(Channel::Game), "client disconnected");
}

/// Serves one debug viewer until it disconnects.
pub(crate) async fn serve_debug(stream: TcpStream, peer: SocketAddr, shared: Shared) {
    let (reader, writer) = stream.into_split();
    let (id, outbox) = open(&shared, Channel::Debug, writer, peer);
    info!(%peer, "debug client connected");

    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match decode::<DebugCommand>(&line) {
            Ok(command) => {
                let outcome = shared.sync.lock().handle_debug(command, unix_millis());
                dispatch(&shared, &outbox, outcome);
            }
            Err(error) => debug!(%peer, %error, "dropped malformed debug command"),
        }
    }

    shared.hub.unregister(Channel::Debug, id);
    info!(%peer, "debug client disconnected");
}
