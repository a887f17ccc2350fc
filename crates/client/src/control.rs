//! Control-plane boundary.
//!
//! The attach session talks to the supervisor over two planes: the packet
//! transport carrying stdio frames, and an out-of-band RPC surface for
//! attach and resize calls. This module defines the RPC surface as a trait;
//! marshaling and transport of those calls belong to the embedder.

use std::path::Path;

use async_trait::async_trait;

/// A terminal width/height pair from the caller's resize source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    /// Terminal width in columns.
    pub width: u16,
    /// Terminal height in rows.
    pub height: u16,
}

/// The control-plane calls an attach session depends on.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Ask the supervisor to serve an attach for the container on the given
    /// socket path. Must succeed before the data-plane transport is used;
    /// failure is fatal for the session.
    async fn attach_container(&self, id: &str, socket_path: &Path) -> anyhow::Result<()>;

    /// Resize the container's terminal. Best-effort: the resize watcher logs
    /// and swallows individual failures, so streaming never depends on this
    /// call succeeding.
    async fn set_window_size(&self, id: &str, size: TerminalSize) -> anyhow::Result<()>;
}
