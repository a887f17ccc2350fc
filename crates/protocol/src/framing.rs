//! Frame codec for the attach data plane.
//!
//! # Frame Format
//!
//! Each frame travels as exactly one packet on a boundary-preserving
//! transport:
//!
//! - 1 byte: stream tag (1 = stdin, 2 = stdout, 3 = stderr)
//! - N bytes: payload, N <= 8192
//!
//! There is no length field and no reassembly: the packet boundary of the
//! underlying SOCK_SEQPACKET socket delimits the frame. Any non-empty chunk
//! returned by a single read is one complete, in-order frame.

use crate::error::{ProtocolError, Result};

/// Maximum payload bytes carried by a single frame.
pub const MAX_PAYLOAD_SIZE: usize = 8192;

/// Maximum encoded frame size: one tag byte plus the payload.
pub const MAX_FRAME_SIZE: usize = MAX_PAYLOAD_SIZE + 1;

/// Identifies which standard stream a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamTag {
    /// Input forwarded to the container. Valid in the write direction only.
    Stdin = 1,
    /// Container standard output.
    Stdout = 2,
    /// Container standard error.
    Stderr = 3,
}

impl StreamTag {
    /// Raw wire value of the tag.
    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte. An unknown value is a protocol violation by the
    /// peer, not something to be skipped over.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            1 => Ok(StreamTag::Stdin),
            2 => Ok(StreamTag::Stdout),
            3 => Ok(StreamTag::Stderr),
            other => Err(ProtocolError::UnroutableTag { tag: other }),
        }
    }
}

/// A single unit of attach-stream traffic.
///
/// Frames are transient: each one is encoded, sent, decoded and routed,
/// then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The stream this frame belongs to.
    pub tag: StreamTag,
    /// The payload data.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame with the given tag and payload.
    pub fn new(tag: StreamTag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    /// Encode the frame into bytes for a single packet send.
    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut output = Vec::with_capacity(1 + self.payload.len());
        output.push(self.tag.as_byte());
        output.extend_from_slice(&self.payload);
        Ok(output)
    }

    /// Decode one packet's worth of bytes into a frame.
    ///
    /// The buffer must hold exactly the bytes of one read operation: byte 0
    /// is the tag and the remainder is the payload. An empty buffer is
    /// rejected, since a zero-length read signals end of stream.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let Some((&tag, payload)) = buf.split_first() else {
            return Err(ProtocolError::EmptyFrame);
        };
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }

        Ok(Self {
            tag: StreamTag::from_byte(tag)?,
            payload: payload.to_vec(),
        })
    }
}
