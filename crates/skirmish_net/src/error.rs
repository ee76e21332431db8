//! # Network Error Types
//!
//! Only the server's own plumbing can fail: binding sockets, encoding
//! messages, starting the simulation. Client misbehaviour is never an error.

use skirmish_sim::SimError;
use thiserror::Error;

/// Errors raised by the transport and the wire codec.
#[derive(Error, Debug)]
pub enum NetError {
    /// Socket or stream failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded or decoded.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// The simulation could not be started.
    #[error("simulation setup failed: {0}")]
    Sim(#[from] SimError),

    /// A configured address does not parse.
    #[error("invalid address {addr}: {source}")]
    InvalidAddress {
        /// The configured text.
        addr: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },
}

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;
