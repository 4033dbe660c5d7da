//! Network utilities
//!
//! This module provides listener bootstrap over resolved local addresses,
//! exact-count transfers over byte streams, and port text validation.
//! Everything here is synchronous and blocking; no state outlives a call.

use std::time::Duration;

pub mod addr;
pub mod port;
pub mod resolver;
pub mod tcp;
pub mod transfer;

pub use addr::SockAddr;
pub use port::{is_valid_port, parse_decimal, parse_port, ParsedNumber};
pub use resolver::{resolve_passive, Candidate};
pub use tcp::{start_listener, TcpExt, TcpListenerBuilder, TcpListenerExt};
pub use transfer::{read_all, read_all_fd, write_all, write_all_fd};

/// Listen backlog used when none is configured
pub const BACKLOG: i32 = 100;

/// Suggested buffer size for callers moving data in chunks
pub const BUF_LEN: usize = 4096;

/// Suggested socket read/write timeout, see [`TcpExt::set_io_timeout`]
pub const SOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Lowest accepted port; privileged ports are rejected
pub const PORT_MIN: i64 = 1025;

/// Highest accepted port
pub const PORT_MAX: i64 = 65535;

/// Result type for network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Network operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address resolution failed: {0}")]
    ResolutionFailed(String),

    #[error("No usable local address for {0}")]
    NoUsableAddress(String),

    #[error("Invalid port {input:?}: {reason}")]
    InvalidPort { input: String, reason: &'static str },

    #[error("Unsupported address family: {0}")]
    UnsupportedFamily(String),
}
