//! Shared helpers for the task and session tests.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use protocol::{Frame, StreamTag, MAX_FRAME_SIZE};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::control::{ControlPlane, TerminalSize};
use crate::transport::PacketConn;

/// Reader that yields exactly the given chunks, one per read, then EOF.
pub struct ChunkReader {
    chunks: std::vec::IntoIter<Vec<u8>>,
}

impl ChunkReader {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter(),
        }
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(chunk) = self.chunks.next() {
            buf.put_slice(&chunk);
        }
        Poll::Ready(Ok(()))
    }
}

/// Sink whose written bytes stay inspectable after the sink is boxed away.
pub struct SharedSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl SharedSink {
    pub fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Self { buf: buf.clone() }, buf)
    }
}

impl AsyncWrite for SharedSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Sink that accepts at most a fixed number of bytes per write.
pub struct ShortSink {
    limit: usize,
}

impl ShortSink {
    pub fn accepting(limit: usize) -> Self {
        Self { limit }
    }
}

impl AsyncWrite for ShortSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(data.len().min(self.limit)))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Control plane that records calls and can fail on demand.
#[derive(Default)]
pub struct RecordingControl {
    pub attach_calls: Mutex<Vec<(String, PathBuf)>>,
    pub resize_calls: Mutex<Vec<(String, u16, u16)>>,
    pub fail_attach: bool,
    resize_failures: AtomicUsize,
}

impl RecordingControl {
    pub fn failing_attach() -> Self {
        Self {
            fail_attach: true,
            ..Self::default()
        }
    }

    /// Fail the first `n` resize calls, then succeed.
    pub fn failing_resizes(n: usize) -> Self {
        Self {
            resize_failures: AtomicUsize::new(n),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ControlPlane for RecordingControl {
    async fn attach_container(&self, id: &str, socket_path: &Path) -> anyhow::Result<()> {
        if self.fail_attach {
            anyhow::bail!("attach rejected by supervisor");
        }
        self.attach_calls
            .lock()
            .unwrap()
            .push((id.to_string(), socket_path.to_path_buf()));
        Ok(())
    }

    async fn set_window_size(&self, id: &str, size: TerminalSize) -> anyhow::Result<()> {
        let remaining = self.resize_failures.load(Ordering::Acquire);
        if remaining > 0 {
            self.resize_failures.store(remaining - 1, Ordering::Release);
            anyhow::bail!("resize rejected by supervisor");
        }
        self.resize_calls
            .lock()
            .unwrap()
            .push((id.to_string(), size.width, size.height));
        Ok(())
    }
}

/// Send one encoded frame over a packet connection.
pub async fn send_frame(conn: &dyn PacketConn, tag: StreamTag, payload: &[u8]) {
    let encoded = Frame::new(tag, payload.to_vec()).encode().unwrap();
    conn.send(&encoded).await.unwrap();
}

/// Drain a packet connection into decoded frames until EOF.
pub async fn recv_frames(conn: &dyn PacketConn) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut buf = vec![0u8; MAX_FRAME_SIZE];
    loop {
        let n = conn.recv(&mut buf).await.unwrap();
        if n == 0 {
            return frames;
        }
        frames.push(Frame::decode(&buf[..n]).unwrap());
    }
}
