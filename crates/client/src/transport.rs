//! Packet-oriented duplex transport for the attach data plane.
//!
//! The wire framing has no length field, so the transport must preserve
//! message boundaries per send/recv. That makes SOCK_SEQPACKET the socket
//! type of choice; a plain byte stream would merge frames and corrupt the
//! session. [`DuplexConn`] provides an in-memory pair with the same
//! semantics for tests and embedders.
//!
//! The trait takes `&self` for both directions: the stdin forwarder owns
//! writes, the output demultiplexer owns reads, and neither needs a lock
//! because they never touch the other's direction.

use std::io;
use std::net::Shutdown;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::socket::{self, AddressFamily, MsgFlags, SockFlag, SockType, UnixAddr};
use tokio::io::unix::AsyncFd;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex as AsyncMutex, Notify};

/// A duplex channel that preserves message boundaries per operation.
#[async_trait]
pub trait PacketConn: Send + Sync {
    /// Send one packet. The payload boundary is preserved end to end.
    async fn send(&self, buf: &[u8]) -> io::Result<usize>;

    /// Receive one packet into `buf`. Returns 0 on end of stream.
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Shut down one or both directions. Closing the read direction must
    /// wake a blocked `recv` promptly; closing the write direction signals
    /// EOF to the peer once it has drained.
    fn shutdown(&self, how: Shutdown) -> io::Result<()>;
}

/// A SOCK_SEQPACKET AF_UNIX connection to the supervisor's attach socket.
#[derive(Debug)]
pub struct SeqpacketConn {
    fd: AsyncFd<OwnedFd>,
}

impl SeqpacketConn {
    /// Connect to the attach socket at `path`.
    ///
    /// Attach sockets live under per-container state directories whose paths
    /// routinely exceed the `sun_path` limit, so over-long paths are
    /// connected through their parent directory via `/proc/self/fd`.
    pub async fn connect(path: &Path) -> io::Result<Self> {
        let path = path.to_path_buf();
        let fd = tokio::task::spawn_blocking(move || connect_blocking(&path))
            .await
            .map_err(io::Error::other)??;
        Self::from_owned_fd(fd)
    }

    /// Wrap an already-connected seqpacket socket.
    ///
    /// The fd is switched to non-blocking mode and registered with the
    /// tokio reactor, so this must run inside a runtime.
    pub fn from_owned_fd(fd: OwnedFd) -> io::Result<Self> {
        let flags = fcntl(fd.as_raw_fd(), FcntlArg::F_GETFL).map_err(io::Error::from)?;
        let flags = OFlag::from_bits_retain(flags) | OFlag::O_NONBLOCK;
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFL(flags)).map_err(io::Error::from)?;
        Ok(Self {
            fd: AsyncFd::new(fd)?,
        })
    }
}

fn connect_blocking(path: &Path) -> io::Result<OwnedFd> {
    let fd = socket::socket(
        AddressFamily::Unix,
        SockType::SeqPacket,
        SockFlag::SOCK_CLOEXEC,
        None,
    )
    .map_err(io::Error::from)?;

    match UnixAddr::new(path) {
        Ok(addr) => socket::connect(fd.as_raw_fd(), &addr).map_err(io::Error::from)?,
        Err(Errno::ENAMETOOLONG) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "socket path has no parent directory",
                    )
                })?;
            let name = path.file_name().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "socket path has no file name")
            })?;
            // the short proxy path stays valid as long as `dir` is open
            let dir = std::fs::File::open(dir)?;
            let proxy = Path::new("/proc/self/fd")
                .join(dir.as_raw_fd().to_string())
                .join(name);
            let addr = UnixAddr::new(&proxy).map_err(io::Error::from)?;
            socket::connect(fd.as_raw_fd(), &addr).map_err(io::Error::from)?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(fd)
}

#[async_trait]
impl PacketConn for SeqpacketConn {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|inner| {
                socket::send(inner.as_raw_fd(), buf, MsgFlags::empty()).map_err(io::Error::from)
            }) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|inner| {
                socket::recv(inner.as_raw_fd(), buf, MsgFlags::empty()).map_err(io::Error::from)
            }) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        let how = match how {
            Shutdown::Read => socket::Shutdown::Read,
            Shutdown::Write => socket::Shutdown::Write,
            Shutdown::Both => socket::Shutdown::Both,
        };
        socket::shutdown(self.fd.get_ref().as_raw_fd(), how).map_err(io::Error::from)
    }
}

/// One endpoint of an in-memory packet-preserving duplex pair.
///
/// Each direction is a channel of whole packets, so boundaries survive by
/// construction. Used by the test suite and by embedders that bring their
/// own socket plumbing.
pub struct DuplexConn {
    tx: StdMutex<Option<UnboundedSender<Vec<u8>>>>,
    rx: AsyncMutex<UnboundedReceiver<Vec<u8>>>,
    read_closed: AtomicBool,
    read_notify: Notify,
}

impl DuplexConn {
    /// Create a connected pair of in-memory packet transports.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = unbounded_channel();
        let (b_tx, a_rx) = unbounded_channel();
        (Self::endpoint(a_tx, a_rx), Self::endpoint(b_tx, b_rx))
    }

    fn endpoint(tx: UnboundedSender<Vec<u8>>, rx: UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            tx: StdMutex::new(Some(tx)),
            rx: AsyncMutex::new(rx),
            read_closed: AtomicBool::new(false),
            read_notify: Notify::new(),
        }
    }
}

#[async_trait]
impl PacketConn for DuplexConn {
    async fn send(&self, buf: &[u8]) -> io::Result<usize> {
        let tx = self.tx.lock().unwrap().clone();
        let Some(tx) = tx else {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write direction is shut down",
            ));
        };
        tx.send(buf.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer is gone"))?;
        Ok(buf.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let closed = self.read_notify.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();
        if self.read_closed.load(Ordering::Acquire) {
            return Ok(0);
        }

        let mut rx = self.rx.lock().await;
        tokio::select! {
            _ = closed => Ok(0),
            packet = rx.recv() => match packet {
                Some(packet) => {
                    // datagram semantics: a too-small buffer truncates
                    let n = packet.len().min(buf.len());
                    buf[..n].copy_from_slice(&packet[..n]);
                    Ok(n)
                }
                None => Ok(0),
            },
        }
    }

    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        if matches!(how, Shutdown::Write | Shutdown::Both) {
            self.tx.lock().unwrap().take();
        }
        if matches!(how, Shutdown::Read | Shutdown::Both) {
            self.read_closed.store(true, Ordering::Release);
            self.read_notify.notify_waiters();
        }
        Ok(())
    }
}
