use std::io;
use thiserror::Error;

use crate::clock::ClockError;

/// Why a decoded reply was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReply {
    #[error("server clock is not synchronized (leap indicator 3)")]
    Unsynchronized,
    #[error("unexpected mode {0}, expected server mode 4")]
    UnexpectedMode(u8),
    #[error("stratum 0 (kiss-o'-death or unsynchronized source)")]
    ZeroStratum,
    #[error("transmit timestamp is zero")]
    ZeroTransmitTimestamp,
}

/// Failure of a single sync attempt. None of these are retried internally.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("socket error: {0}")]
    Socket(#[from] io::Error),
    #[error("no reply within {after_ms} ms")]
    Timeout { after_ms: u64 },
    #[error("malformed packet: {len} bytes, expected 48")]
    MalformedPacket { len: usize },
    #[error("invalid reply: {0}")]
    InvalidReply(#[from] InvalidReply),
    #[error("clock update failed: {0}")]
    Clock(#[from] ClockError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
