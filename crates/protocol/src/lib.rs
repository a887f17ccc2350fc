//! # Conmux Attach Protocol
//!
//! Wire-level building blocks for the attach/exec data plane of the conmux
//! container supervisor client.
//!
//! ## Overview
//!
//! The protocol crate is the dependency-light foundation of the attach
//! layer, providing:
//!
//! - **Frame Codec**: one tag byte plus payload, delimited by the packet
//!   boundary of the underlying transport
//! - **Detach Scanner**: detach-key detection that is safe across arbitrary
//!   read chunk boundaries
//! - **Error Types**: protocol violations surfaced as typed errors
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │      stdin / stdout / stderr bytes       │
//! ├──────────────────────────────────────────┤
//! │       Framing (1 tag byte + payload)     │
//! ├──────────────────────────────────────────┤
//! │  Transport (SOCK_SEQPACKET, one frame    │
//! │  per boundary-preserving send/recv)      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! There is deliberately no length field in the framing: the transport is
//! required to preserve message boundaries, so one read is one frame. Feeding
//! these frames over a plain byte stream would corrupt the session.
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::{DetachScanner, Frame, StreamTag};
//!
//! // Frame a chunk of container output
//! let frame = Frame::new(StreamTag::Stdout, b"hello".to_vec());
//! let bytes = frame.encode().unwrap();
//! let decoded = Frame::decode(&bytes).unwrap();
//! assert_eq!(decoded.payload, b"hello");
//!
//! // Scan typed input for the detach sequence
//! let mut scanner = DetachScanner::new(b"\x10\x11");
//! let (forward, matched) = scanner.scan(b"ls\n\x10\x11");
//! assert_eq!(forward, b"ls\n");
//! assert!(matched);
//! ```
//!
//! ## Modules
//!
//! - [`framing`]: Stream tags and the frame codec
//! - [`detach`]: Detach-key scanner
//! - [`error`]: Error types

pub mod detach;
pub mod error;
pub mod framing;

pub use detach::DetachScanner;
pub use error::{ProtocolError, Result};
pub use framing::{Frame, StreamTag, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
