//! Error types for the attach client.

use protocol::ProtocolError;
use thiserror::Error;
use tokio::task::JoinError;

/// Attach error type covering all session failure modes.
///
/// Detaching is deliberately not represented here: the operator typing the
/// detach sequence is a normal terminal outcome
/// ([`SessionOutcome::Detached`](crate::session::SessionOutcome::Detached)),
/// not a failure.
#[derive(Debug, Error)]
pub enum AttachError {
    /// A control-plane RPC failed. Fatal during attach; resize failures are
    /// logged and swallowed before they ever reach this type.
    #[error("control call failed: {0}")]
    ControlCall(anyhow::Error),

    /// Read or write failure on the data-plane transport.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Read or write failure on a caller-supplied standard stream.
    #[error("stdio error: {0}")]
    Stdio(#[source] std::io::Error),

    /// The peer violated the wire protocol.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// A sink accepted fewer bytes than it was given.
    #[error("short write: {written} of {expected} bytes")]
    ShortWrite {
        /// Bytes the sink actually accepted.
        written: usize,
        /// Bytes the sink was given.
        expected: usize,
    },

    /// A pre-attach or post-attach hook failed.
    #[error("hook failed: {0}")]
    Hook(anyhow::Error),

    /// The session configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A streaming task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(#[from] JoinError),
}

/// Result type alias for attach operations.
pub type Result<T> = std::result::Result<T, AttachError>;
