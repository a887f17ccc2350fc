//! Session coordinator.
//!
//! The coordinator owns the transport for the lifetime of one attach
//! session. It issues the attach control call, starts the stdin forwarder
//! and output demultiplexer as concurrent tasks sharing one transport
//! handle (one direction each), and reconciles whichever of the two
//! finishes first into the session's single outcome. Either side may
//! legitimately finish before the other: a caller piping a fixed stdin
//! payload stops writing long before output ends, while a container that
//! exits immediately stops producing output long before an interactive
//! caller stops typing. The rules below depend only on which side finished
//! first and why, never on wall-clock timing.

use std::net::Shutdown;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AttachConfig;
use crate::control::ControlPlane;
use crate::error::{AttachError, Result};
use crate::output::pump_output;
use crate::resize::spawn_resize_watcher;
use crate::stdin::{forward_stdin, StdinStatus};
use crate::transport::{PacketConn, SeqpacketConn};

/// Terminal state of a finished attach session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Streaming ended with EOF on one of the two directions.
    CleanEof,
    /// The operator typed the detach key sequence.
    Detached,
}

/// Client-side attach session against a container supervisor.
pub struct AttachSession {
    control: Arc<dyn ControlPlane>,
}

impl AttachSession {
    /// Create a session driver on top of the given control plane.
    pub fn new(control: Arc<dyn ControlPlane>) -> Self {
        Self { control }
    }

    /// Run a full attach session, dialing the supervisor's attach socket
    /// once the attach control call has been acknowledged.
    pub async fn run(&self, cfg: AttachConfig) -> Result<SessionOutcome> {
        self.attach_call(&cfg).await?;
        if cfg.passthrough {
            return run_passthrough(cfg);
        }

        let conn = SeqpacketConn::connect(&cfg.socket_path)
            .await
            .map_err(AttachError::Transport)?;
        self.stream(cfg, Arc::new(conn)).await
    }

    /// Run an attach session over an already-established transport.
    ///
    /// This is `run` minus the socket dialing, for embedders (and tests)
    /// that bring their own packet transport.
    pub async fn run_with_conn(
        &self,
        cfg: AttachConfig,
        conn: Arc<dyn PacketConn>,
    ) -> Result<SessionOutcome> {
        self.attach_call(&cfg).await?;
        if cfg.passthrough {
            return run_passthrough(cfg);
        }
        self.stream(cfg, conn).await
    }

    async fn attach_call(&self, cfg: &AttachConfig) -> Result<()> {
        self.control
            .attach_container(&cfg.container_id, &cfg.socket_path)
            .await
            .map_err(AttachError::ControlCall)
    }

    async fn stream(&self, cfg: AttachConfig, conn: Arc<dyn PacketConn>) -> Result<SessionOutcome> {
        let result = self.stream_inner(cfg, &conn).await;
        // full close on every path; a task still blocked on the transport
        // wakes up and winds down on its own
        if let Err(error) = conn.shutdown(Shutdown::Both) {
            tracing::debug!(%error, "Failed to shut down attach socket");
        }
        result
    }

    async fn stream_inner(
        &self,
        cfg: AttachConfig,
        conn: &Arc<dyn PacketConn>,
    ) -> Result<SessionOutcome> {
        cfg.validate()?;
        let AttachConfig {
            container_id,
            stop_after_stdin_eof,
            detach_keys,
            resize,
            streams,
            pre_attach,
            post_attach,
            ..
        } = cfg;

        tracing::debug!(container_id = %container_id, "Attaching to container");

        if let Some(resize) = resize {
            spawn_resize_watcher(Arc::clone(&self.control), container_id.clone(), resize);
        }
        if let Some(hook) = pre_attach {
            hook().map_err(AttachError::Hook)?;
        }

        let deliver_stdout = streams.attach_stdout;
        let deliver_stderr = streams.attach_stderr;

        let mut stdin_task: JoinHandle<Result<StdinStatus>> =
            match (streams.attach_stdin, streams.stdin) {
                (true, Some(stdin)) => {
                    tokio::spawn(forward_stdin(stdin, Arc::clone(conn), detach_keys))
                }
                // nothing to forward: completes right away with a clean EOF
                _ => tokio::spawn(async { Ok(StdinStatus::Eof) }),
            };
        let mut output_task: JoinHandle<Result<()>> = tokio::spawn(pump_output(
            Arc::clone(conn),
            streams.stdout,
            streams.stderr,
            deliver_stdout,
            deliver_stderr,
        ));

        if let Some(hook) = post_attach {
            hook().map_err(AttachError::Hook)?;
        }

        tokio::select! {
            output = &mut output_task => {
                // the read direction is done, so nothing more will arrive;
                // stop feeding the peer and report whatever output produced
                half_close_write(conn);
                output??;
                Ok(SessionOutcome::CleanEof)
            }
            stdin = &mut stdin_task => {
                let status = stdin?;
                if stop_after_stdin_eof {
                    // sessions that leave stdin open return on client EOF
                    // without draining the remaining output
                    return Ok(SessionOutcome::CleanEof);
                }
                match status {
                    Ok(StdinStatus::Detached) => {
                        half_close_write(conn);
                        Ok(SessionOutcome::Detached)
                    }
                    Ok(StdinStatus::Eof) => {
                        half_close_write(conn);
                        if deliver_stdout || deliver_stderr {
                            output_task.await??;
                        }
                        Ok(SessionOutcome::CleanEof)
                    }
                    Err(error) => {
                        half_close_write(conn);
                        Err(error)
                    }
                }
            }
        }
    }
}

/// Passthrough sessions do not multiplex: the pre-attach hook still runs,
/// then the caller's own std streams carry the I/O directly.
fn run_passthrough(cfg: AttachConfig) -> Result<SessionOutcome> {
    if let Some(hook) = cfg.pre_attach {
        hook().map_err(AttachError::Hook)?;
    }
    Ok(SessionOutcome::CleanEof)
}

fn half_close_write(conn: &Arc<dyn PacketConn>) {
    if let Err(error) = conn.shutdown(Shutdown::Write) {
        tracing::error!(%error, "Unable to half-close attach socket");
    }
}
