//! Module about unix domain socket channel. See [UnixStream].
//! Used by tests and same-host runs where TCP setup is not needed.

use crate::channel_utils::SyncChannel;
use std::io::{BufReader, BufWriter, Result};
use std::os::unix::net::UnixStream;

/// The concrete channel type over a unix socketpair.
pub type UnixChannel = SyncChannel<BufReader<UnixStream>, BufWriter<UnixStream>>;

/// Create a connected pair of channels over a unix socketpair.
pub fn unix_channel_pair() -> Result<(UnixChannel, UnixChannel)> {
    let (left, right) = UnixStream::pair()?;
    let left_read = left.try_clone()?;
    let right_read = right.try_clone()?;
    Ok((
        SyncChannel::new(BufReader::new(left_read), BufWriter::new(left)),
        SyncChannel::new(BufReader::new(right_read), BufWriter::new(right)),
    ))
}
