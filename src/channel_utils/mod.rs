//! Channel utilities. Channels carry the framed share exchanges between the
//! two parties.
//!
//! A channel is a blocking, ordered byte stream. [`ShareChannel`] is the
//! interface the protocol layers program against; [`SyncChannel`] implements
//! it over any `Read`/`Write` pair. Concrete constructors live in
//! [`tcp_channel`] (the deployment transport), [`unix_channel`] (same-host
//! socketpairs) and [`crossbeam_channel`] (in-process, used by tests and
//! benches).
//!
//! All fixed-width integers cross the wire as explicit little-endian. Both
//! sides must agree on the byte count of every exchange; a channel has no
//! framing of its own.
//!
//! # Example
//!
//! ```
//! use two_party_sharing_with_beaver::channel_utils::ShareChannel;
//! use two_party_sharing_with_beaver::channel_utils::crossbeam_channel::cbch_pair;
//! use two_party_sharing_with_beaver::channel_utils::SyncChannel;
//!
//! let (s1, r1) = cbch_pair();
//! let (s2, r2) = cbch_pair();
//! let mut left = SyncChannel::new(r1, s2);
//! let mut right = SyncChannel::new(r2, s1);
//!
//! let handle = std::thread::spawn(move || {
//!     let x = right.recv_u32().unwrap();
//!     right.send_u32(x + 1).unwrap();
//!     right.flush().unwrap();
//! });
//!
//! left.send_u32(41).unwrap();
//! left.flush().unwrap();
//! assert_eq!(left.recv_u32().unwrap(), 42);
//!
//! handle.join().unwrap();
//! ```

use itertools::Itertools;
use std::io::{Read, Result, Write};

pub mod crossbeam_channel;
pub mod tcp_channel;
pub mod unix_channel;

/// Blocking, fully-framed byte exchange between exactly two endpoints.
///
/// `send_bytes` and `recv_bytes` either move the whole buffer or fail; a
/// short read caused by the peer closing surfaces as
/// [`std::io::ErrorKind::UnexpectedEof`]. Writes may be buffered until
/// [`flush`](ShareChannel::flush).
pub trait ShareChannel {
    /// Write all of `buf` to the peer.
    fn send_bytes(&mut self, buf: &[u8]) -> Result<()>;

    /// Read exactly `buf.len()` bytes from the peer.
    fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Push any buffered writes to the underlying stream.
    fn flush(&mut self) -> Result<()>;

    /// Send one u32, little-endian.
    fn send_u32(&mut self, x: u32) -> Result<()> {
        self.send_bytes(&x.to_le_bytes())
    }

    /// Receive one u32, little-endian.
    fn recv_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.recv_bytes(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Send a slice of u32 values as one contiguous write.
    fn send_u32s(&mut self, xs: &[u32]) -> Result<()> {
        let bytes = xs.iter().flat_map(|x| x.to_le_bytes()).collect_vec();
        self.send_bytes(&bytes)
    }

    /// Receive exactly `n` u32 values.
    fn recv_u32s(&mut self, n: usize) -> Result<Vec<u32>> {
        let mut bytes = vec![0u8; 4 * n];
        self.recv_bytes(&mut bytes)?;
        let xs = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect_vec();
        Ok(xs)
    }
}

/// A channel over a `Read` half and a `Write` half of the same stream.
#[derive(Debug)]
pub struct SyncChannel<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> SyncChannel<R, W> {
    /// Pair a reader and a writer into a channel.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W: Write> ShareChannel for SyncChannel<R, W> {
    fn send_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.writer.write_all(buf)
    }

    fn recv_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }
}
