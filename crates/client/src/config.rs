//! Attach session configuration.

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::control::TerminalSize;
use crate::error::{AttachError, Result};

/// Boxed async reader supplying the caller's stdin bytes.
pub type StdinSource = Box<dyn AsyncRead + Send + Unpin>;

/// Boxed async writer receiving demultiplexed output.
pub type OutputSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Hook run synchronously around stream attachment. A hook's failure aborts
/// the session with that error.
pub type AttachHook = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// The standard streams for an attach session.
///
/// A deliver flag without its matching sink is rejected up front; a sink
/// without its flag is simply never written to.
#[derive(Default)]
pub struct AttachStreams {
    /// The caller's stdin source, if any.
    pub stdin: Option<StdinSource>,
    /// Sink for stdout-tagged frames.
    pub stdout: Option<OutputSink>,
    /// Sink for stderr-tagged frames.
    pub stderr: Option<OutputSink>,
    /// Forward bytes from `stdin` to the container.
    pub attach_stdin: bool,
    /// Deliver stdout-tagged payloads to the `stdout` sink.
    pub attach_stdout: bool,
    /// Deliver stderr-tagged payloads to the `stderr` sink.
    pub attach_stderr: bool,
}

/// Configuration for one attach session.
pub struct AttachConfig {
    /// ID of the container.
    pub container_id: String,
    /// Path of the attach socket.
    pub socket_path: PathBuf,
    /// Exec session ID, if this attaches to an exec rather than the main
    /// container process.
    pub exec_session: Option<String>,
    /// Whether a terminal was set up for the command being attached to.
    pub tty: bool,
    /// Return as soon as stdin reaches EOF instead of draining remaining
    /// output.
    pub stop_after_stdin_eof: bool,
    /// Bypass multiplexing entirely; the caller's own std streams carry the
    /// I/O and no transport is opened.
    pub passthrough: bool,
    /// Channel of terminal resize events.
    pub resize: Option<mpsc::Receiver<TerminalSize>>,
    /// The standard streams for this attach session.
    pub streams: AttachStreams,
    /// Run before the streams are attached. Could be used to start a
    /// container.
    pub pre_attach: Option<AttachHook>,
    /// Run after the streams are attached, e.g. to notify callers that
    /// streaming has begun.
    pub post_attach: Option<AttachHook>,
    /// Byte sequence that detaches the session when typed; empty disables
    /// detach detection.
    pub detach_keys: Vec<u8>,
}

impl AttachConfig {
    /// Create a configuration with everything disabled except the required
    /// identifiers.
    pub fn new(container_id: impl Into<String>, socket_path: impl Into<PathBuf>) -> Self {
        Self {
            container_id: container_id.into(),
            socket_path: socket_path.into(),
            exec_session: None,
            tty: false,
            stop_after_stdin_eof: false,
            passthrough: false,
            resize: None,
            streams: AttachStreams::default(),
            pre_attach: None,
            post_attach: None,
            detach_keys: Vec::new(),
        }
    }

    /// Reject configurations that would only fail mid-stream.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.streams.attach_stdout && self.streams.stdout.is_none() {
            return Err(AttachError::Config(
                "stdout delivery enabled without a stdout sink".to_string(),
            ));
        }
        if self.streams.attach_stderr && self.streams.stderr.is_none() {
            return Err(AttachError::Config(
                "stderr delivery enabled without a stderr sink".to_string(),
            ));
        }
        Ok(())
    }
}
