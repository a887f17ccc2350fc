//! Detach-key detection over a chunked byte stream.
//!
//! The operator's detach sequence can arrive split across any number of
//! reads, so the scanner keeps the length of the partial match between
//! calls. Bytes that might belong to the sequence are held back until the
//! match either completes (the session detaches, held bytes are discarded)
//! or breaks (the held prefix turns out to be ordinary data and is
//! forwarded).

/// Scans an outgoing byte stream for a configured detach-key sequence.
///
/// One scanner instance covers one stdin forwarding run; the in-progress
/// match position is the only state and starts at zero.
#[derive(Debug)]
pub struct DetachScanner {
    keys: Vec<u8>,
    matched: usize,
}

impl DetachScanner {
    /// Create a scanner for the given key sequence. An empty sequence
    /// disables detach detection entirely.
    pub fn new(keys: &[u8]) -> Self {
        Self {
            keys: keys.to_vec(),
            matched: 0,
        }
    }

    /// Whether a detach sequence is configured.
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Scan one chunk of input.
    ///
    /// Returns the bytes safe to forward and whether the detach sequence
    /// completed inside this chunk. On a match, the key bytes themselves and
    /// anything after them are discarded. A byte that breaks a partial match
    /// flushes the held-back prefix as ordinary data, and matching restarts
    /// at the breaking byte itself.
    pub fn scan(&mut self, chunk: &[u8]) -> (Vec<u8>, bool) {
        if self.keys.is_empty() {
            return (chunk.to_vec(), false);
        }

        let mut forward = Vec::with_capacity(chunk.len());
        for &byte in chunk {
            if byte == self.keys[self.matched] {
                self.matched += 1;
                if self.matched == self.keys.len() {
                    self.matched = 0;
                    return (forward, true);
                }
            } else {
                forward.extend_from_slice(&self.keys[..self.matched]);
                self.matched = 0;
                if byte == self.keys[0] {
                    self.matched = 1;
                } else {
                    forward.push(byte);
                }
            }
        }
        (forward, false)
    }
}
