//! Error types for the protocol crate.

use thiserror::Error;

/// Protocol error type covering all wire-level failure modes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload exceeds the per-frame limit.
    #[error("payload too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge {
        /// Actual payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// A zero-length buffer was handed to the decoder. A zero-length read
    /// from the peer means end of stream, never a frame.
    #[error("empty frame: a zero-length read is end of stream, not a frame")]
    EmptyFrame,

    /// A frame carried a tag that cannot be routed to a local stream.
    #[error("unroutable stream tag: {tag}")]
    UnroutableTag {
        /// The offending tag byte.
        tag: u8,
    },
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
