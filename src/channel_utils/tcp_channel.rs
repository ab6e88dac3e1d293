//! Module about tcp channel. See [TcpStream].
//!
//! Party 0 binds and accepts exactly one connection; party 1 connects.
//! [`connect`] retries until the listener is up so the two processes can be
//! launched in either order.

use crate::channel_utils::SyncChannel;
use crate::errors::Error;
use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Default protocol port when none is configured.
pub const DEFAULT_PORT: u16 = 12345;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// The concrete channel type used over TCP.
pub type TcpChannel = SyncChannel<BufReader<TcpStream>, BufWriter<TcpStream>>;

fn wrap(stream: TcpStream) -> Result<TcpChannel, Error> {
    let read_half = stream
        .try_clone()
        .map_err(|e| Error::transport("clone stream", e))?;
    Ok(SyncChannel::new(
        BufReader::new(read_half),
        BufWriter::new(stream),
    ))
}

/// Bind to all interfaces on `port` and accept one peer.
///
/// Blocks until the peer connects. The listener is returned alongside the
/// channel so the caller can hold it open for the session and drop it on
/// teardown.
pub fn listen(port: u16) -> Result<(TcpListener, TcpChannel), Error> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).map_err(|e| Error::transport("bind", e))?;
    let (stream, _peer) = listener.accept().map_err(|e| Error::transport("accept", e))?;
    let channel = wrap(stream)?;
    Ok((listener, channel))
}

/// Connect to the listening party at `host:port`.
///
/// Connection refusals are retried with a short backoff until a 10 second
/// deadline, so it does not matter which party process starts first. Any
/// other socket error is returned immediately.
pub fn connect(host: &str, port: u16) -> Result<TcpChannel, Error> {
    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::transport("resolve", e))?
        .next()
        .ok_or_else(|| Error::InvalidParameter(format!("no address for {}:{}", host, port)))?;

    let deadline = Instant::now() + CONNECT_TIMEOUT;
    loop {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return wrap(stream),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::ConnectionRefused || Instant::now() >= deadline {
                    return Err(Error::transport("connect", e));
                }
                sleep(CONNECT_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel_utils::ShareChannel;

    #[test]
    fn test_listen_connect_exchange() {
        let port = 17712;

        let handle = std::thread::spawn(move || {
            let mut channel = connect("127.0.0.1", port).unwrap();

            let m = channel.recv_u32().unwrap();
            assert_eq!(m, 1);

            channel.send_u32(0).unwrap();
            channel.flush().unwrap();
        });

        let (_listener, mut channel) = listen(port).unwrap();

        channel.send_u32(1).unwrap();
        channel.flush().unwrap();

        let m = channel.recv_u32().unwrap();
        assert_eq!(m, 0);

        handle.join().unwrap();
    }

    #[test]
    fn test_connect_unresolvable_host() {
        let e = connect("host.invalid", DEFAULT_PORT).unwrap_err();
        match e {
            Error::Transport { op, .. } => assert_eq!(op, "resolve"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
