//! # Conmux Attach Client
//!
//! Client-side attach/exec I/O layer for the conmux container supervisor.
//! One attach session multiplexes a container's standard streams over a
//! single packet-oriented transport, while attach and resize calls travel
//! out of band over the control plane.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              Session Coordinator              │  first-completion select
//! ├───────────────┬───────────────┬───────────────┤
//! │ Stdin         │ Output        │ Resize        │  independent tokio tasks
//! │ Forwarder     │ Demultiplexer │ Watcher       │
//! ├───────────────┴───────────────┼───────────────┤
//! │ PacketConn (SOCK_SEQPACKET)   │ ControlPlane  │
//! └───────────────────────────────┴───────────────┘
//! ```
//!
//! The stdin forwarder exclusively owns the write direction and the output
//! demultiplexer the read direction, so the shared transport needs no
//! locking. The coordinator is the only place that waits: whichever task
//! finishes first selects the shutdown branch, and the transport is fully
//! closed on every exit path.
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use client::{AttachConfig, AttachSession, AttachStreams, ControlPlane, TerminalSize};
//!
//! struct MyRpc;
//!
//! #[async_trait]
//! impl ControlPlane for MyRpc {
//!     async fn attach_container(&self, _id: &str, _socket: &Path) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!     async fn set_window_size(&self, _id: &str, _size: TerminalSize) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn attach() -> client::Result<()> {
//! let mut cfg = AttachConfig::new("my-container", "/run/my-container/attach.sock");
//! cfg.streams = AttachStreams {
//!     stdin: Some(Box::new(tokio::io::stdin())),
//!     stdout: Some(Box::new(tokio::io::stdout())),
//!     attach_stdin: true,
//!     attach_stdout: true,
//!     ..AttachStreams::default()
//! };
//! cfg.detach_keys = b"\x10\x11".to_vec(); // ctrl-p ctrl-q
//!
//! let session = AttachSession::new(Arc::new(MyRpc));
//! let outcome = session.run(cfg).await?;
//! println!("session ended: {outcome:?}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`session`]: Session coordinator and outcome
//! - [`config`]: Session configuration surface
//! - [`control`]: Control-plane trait boundary
//! - [`transport`]: Packet transport trait, seqpacket and in-memory impls
//! - [`error`]: Error types

pub mod config;
pub mod control;
pub mod error;
mod output;
mod resize;
pub mod session;
mod stdin;
pub mod transport;

#[cfg(test)]
mod test_util;

pub use config::{AttachConfig, AttachHook, AttachStreams, OutputSink, StdinSource};
pub use control::{ControlPlane, TerminalSize};
pub use error::{AttachError, Result};
pub use session::{AttachSession, SessionOutcome};
pub use transport::{DuplexConn, PacketConn, SeqpacketConn};
