//! Stdin forwarding task.

use std::sync::Arc;

use protocol::{DetachScanner, Frame, StreamTag, MAX_PAYLOAD_SIZE};
use tokio::io::AsyncReadExt;

use crate::config::StdinSource;
use crate::error::{AttachError, Result};
use crate::transport::PacketConn;

/// How a stdin forwarding run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinStatus {
    /// The local input source reached end of file.
    Eof,
    /// The detach key sequence was matched; held-back and remaining input
    /// was discarded.
    Detached,
}

/// Copy the local input source to the transport as stdin-tagged frames.
///
/// Detach detection runs over the raw byte stream before framing, so key
/// bytes split across reads still match. The transport is never closed
/// here; the half-close on stdin EOF is the coordinator's job.
pub(crate) async fn forward_stdin(
    mut stdin: StdinSource,
    conn: Arc<dyn PacketConn>,
    detach_keys: Vec<u8>,
) -> Result<StdinStatus> {
    let mut scanner = DetachScanner::new(&detach_keys);
    let mut buf = vec![0u8; MAX_PAYLOAD_SIZE];

    loop {
        let n = stdin.read(&mut buf).await.map_err(AttachError::Stdio)?;
        if n == 0 {
            return Ok(StdinStatus::Eof);
        }

        let (forward, matched) = scanner.scan(&buf[..n]);
        // a flushed hold-back prefix can push one chunk past the frame limit
        for piece in forward.chunks(MAX_PAYLOAD_SIZE) {
            let encoded = Frame::new(StreamTag::Stdin, piece.to_vec()).encode()?;
            conn.send(&encoded).await.map_err(AttachError::Transport)?;
        }
        if matched {
            return Ok(StdinStatus::Detached);
        }
    }
}
