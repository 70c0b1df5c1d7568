//! Custom error types for the application.
//!
//! `PanelError` covers the failure modes of talking to the bridge. Bridge
//! errors never crash the panel: the sync task logs them and keeps the
//! last-good cache, and click-triggered state sets are best-effort.
//! Argument-parse failures are clap's business and run-loop failures are
//! reported as `anyhow` errors at the binary boundary.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type PanelResult<T> = std::result::Result<T, PanelError>;

#[derive(Error, Debug)]
pub enum PanelError {
    /// No bridge could be found or activated on the local network.
    #[error("Bridge discovery failed: {0}")]
    Discovery(String),

    /// The network transport failed (connect, send, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The bridge answered but the response was not what we expected.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
