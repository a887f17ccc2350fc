//! Output demultiplexing task.

use std::sync::Arc;

use protocol::{Frame, ProtocolError, StreamTag, MAX_FRAME_SIZE};
use tokio::io::AsyncWriteExt;

use crate::config::OutputSink;
use crate::error::{AttachError, Result};
use crate::transport::PacketConn;

/// Read frames from the transport and route payloads to the stdout/stderr
/// sinks until the peer closes or an error occurs.
///
/// Frames for a stream whose delivery is disabled are still read and then
/// discarded: the transport has to keep draining, both to detect EOF and
/// errors and to avoid stalling the peer. A stdin-tagged frame on the read
/// direction is a protocol violation by the peer and fatal for the session.
pub(crate) async fn pump_output(
    conn: Arc<dyn PacketConn>,
    mut stdout: Option<OutputSink>,
    mut stderr: Option<OutputSink>,
    deliver_stdout: bool,
    deliver_stderr: bool,
) -> Result<()> {
    let mut buf = vec![0u8; MAX_FRAME_SIZE];

    loop {
        let n = conn.recv(&mut buf).await.map_err(AttachError::Transport)?;
        if n == 0 {
            return Ok(());
        }

        let frame = Frame::decode(&buf[..n])?;
        let (sink, deliver) = match frame.tag {
            StreamTag::Stdout => (stdout.as_mut(), deliver_stdout),
            StreamTag::Stderr => (stderr.as_mut(), deliver_stderr),
            // stdin frames only ever travel in the write direction
            StreamTag::Stdin => {
                return Err(AttachError::Protocol(ProtocolError::UnroutableTag {
                    tag: StreamTag::Stdin.as_byte(),
                }));
            }
        };
        if !deliver {
            continue;
        }
        // delivery flags without sinks are rejected before streaming starts
        let Some(sink) = sink else { continue };

        let written = sink
            .write(&frame.payload)
            .await
            .map_err(AttachError::Stdio)?;
        if written < frame.payload.len() {
            return Err(AttachError::ShortWrite {
                written,
                expected: frame.payload.len(),
            });
        }
        sink.flush().await.map_err(AttachError::Stdio)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{send_frame, SharedSink, ShortSink};
    use crate::transport::DuplexConn;
    use std::net::Shutdown;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_routes_stdout_and_stderr() {
        let (local, remote) = DuplexConn::pair();

        let (stdout, stdout_buf) = SharedSink::new();
        let (stderr, stderr_buf) = SharedSink::new();

        send_frame(&remote, StreamTag::Stdout, b"out1").await;
        send_frame(&remote, StreamTag::Stderr, b"err1").await;
        send_frame(&remote, StreamTag::Stdout, b"out2").await;
        remote.shutdown(Shutdown::Write).unwrap();

        pump_output(
            Arc::new(local),
            Some(Box::new(stdout)),
            Some(Box::new(stderr)),
            true,
            true,
        )
        .await
        .unwrap();

        assert_eq!(stdout_buf.lock().unwrap().as_slice(), b"out1out2");
        assert_eq!(stderr_buf.lock().unwrap().as_slice(), b"err1");
    }

    #[tokio::test]
    async fn test_disabled_stream_is_drained_not_delivered() {
        let (local, remote) = DuplexConn::pair();

        let (stderr, stderr_buf) = SharedSink::new();

        send_frame(&remote, StreamTag::Stdout, b"discarded").await;
        send_frame(&remote, StreamTag::Stderr, b"e1").await;
        send_frame(&remote, StreamTag::Stdout, b"also discarded").await;
        send_frame(&remote, StreamTag::Stderr, b"e2").await;
        remote.shutdown(Shutdown::Write).unwrap();

        // stdout delivery off entirely: frames must still be read through
        let result = timeout(
            Duration::from_secs(1),
            pump_output(Arc::new(local), None, Some(Box::new(stderr)), false, true),
        )
        .await
        .expect("demultiplexer stalled on a discarded stream");
        result.unwrap();

        assert_eq!(stderr_buf.lock().unwrap().as_slice(), b"e1e2");
    }

    #[tokio::test]
    async fn test_stdin_tag_on_read_direction_is_fatal() {
        let (local, remote) = DuplexConn::pair();

        let (stdout, _buf) = SharedSink::new();
        send_frame(&remote, StreamTag::Stdin, b"backwards").await;

        let err = pump_output(Arc::new(local), Some(Box::new(stdout)), None, true, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AttachError::Protocol(ProtocolError::UnroutableTag { tag: 1 })
        ));
    }

    #[tokio::test]
    async fn test_unknown_tag_is_fatal() {
        let (local, remote) = DuplexConn::pair();

        remote.send(&[9, b'x']).await.unwrap();

        let err = pump_output(Arc::new(local), None, None, false, false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AttachError::Protocol(ProtocolError::UnroutableTag { tag: 9 })
        ));
    }

    #[tokio::test]
    async fn test_short_write_is_fatal() {
        let (local, remote) = DuplexConn::pair();

        send_frame(&remote, StreamTag::Stdout, b"too much data").await;

        let err = pump_output(
            Arc::new(local),
            Some(Box::new(ShortSink::accepting(4))),
            None,
            true,
            false,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            AttachError::ShortWrite {
                written: 4,
                expected: 13
            }
        ));
    }

    #[tokio::test]
    async fn test_clean_eof() {
        let (local, remote) = DuplexConn::pair();
        remote.shutdown(Shutdown::Write).unwrap();

        pump_output(Arc::new(local), None, None, false, false)
            .await
            .unwrap();
    }
}
