//! Two-party exchange façade.
//!
//! [`Party`] hides the listener/connector asymmetry behind symmetric
//! `send_recv` operations: each side submits its own outgoing words and gets
//! the peer's back. Party 0 sends first and then receives; party 1 receives
//! first and then sends. With blocking sockets and no extra threads this
//! stagger is what guarantees progress for payloads larger than the OS send
//! buffer: if both sides wrote first, both could fill their buffers and
//! block forever.
//!
//! The protocol is strictly synchronous. Every completed `send_recv` is a
//! barrier: afterwards both sides hold each other's words for that round,
//! and nothing is pipelined across rounds.

use crate::channel_utils::tcp_channel::{self, TcpChannel};
use crate::channel_utils::ShareChannel;
use crate::errors::Error;
use std::net::TcpListener;

/// Party index. Only 0 and 1 exist; 0 is the listening side.
pub type PartyId = usize;

/// A live session with the peer over some channel.
///
/// Owns the party id, the channel, and the running count of payload bytes
/// sent since construction (or the last [`reset_bytes_sent`]).
///
/// [`reset_bytes_sent`]: Party::reset_bytes_sent
#[derive(Debug)]
pub struct Party<C> {
    id: PartyId,
    channel: C,
    bytes_sent: u64,
}

impl<C: ShareChannel> Party<C> {
    /// Wrap a connected channel. Fails unless `id` is 0 or 1.
    pub fn new(id: PartyId, channel: C) -> Result<Self, Error> {
        if id > 1 {
            return Err(Error::InvalidParameter(format!(
                "party id must be 0 or 1 (got {})",
                id
            )));
        }

        Ok(Self {
            id,
            channel,
            bytes_sent: 0,
        })
    }

    /// This party's id.
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// Payload bytes sent since construction or the last reset.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Reset the bytes-sent counter.
    pub fn reset_bytes_sent(&mut self) {
        self.bytes_sent = 0;
    }

    fn send_words(&mut self, words: &[u32]) -> Result<(), Error> {
        self.channel
            .send_u32s(words)
            .map_err(|e| Error::transport("send share", e))?;
        self.channel
            .flush()
            .map_err(|e| Error::transport("flush", e))?;
        self.bytes_sent += 4 * words.len() as u64;
        Ok(())
    }

    fn recv_words(&mut self, n: usize) -> Result<Vec<u32>, Error> {
        self.channel
            .recv_u32s(n)
            .map_err(|e| Error::transport("recv share", e))
    }

    /// Exchange one word with the peer.
    pub fn send_recv_u32(&mut self, own: u32) -> Result<u32, Error> {
        let peer = self.send_recv_array([own])?;
        Ok(peer[0])
    }

    /// Exchange a fixed-length array of words with the peer. One round,
    /// no length prefix: the length is fixed at compile time on both sides.
    pub fn send_recv_array<const N: usize>(&mut self, own: [u32; N]) -> Result<[u32; N], Error> {
        let peer = if self.id == 0 {
            self.send_words(&own)?;
            self.recv_words(N)?
        } else {
            let peer = self.recv_words(N)?;
            self.send_words(&own)?;
            peer
        };

        let mut out = [0u32; N];
        out.copy_from_slice(&peer);
        Ok(out)
    }

    /// Exchange a vector of words with the peer in one round.
    ///
    /// The agreed element count is carried in a one-word prefix so that a
    /// size disagreement between the callers surfaces as [`Error::Desync`]
    /// instead of a permanently stalled read. Party 1 checks before sending
    /// anything; party 0 checks after its send, before reading the payload.
    pub fn send_recv_vec(&mut self, own: &[u32]) -> Result<Vec<u32>, Error> {
        let n = own.len() as u32;

        let desync = |peer_n: u32| {
            Error::Desync(format!(
                "peer exchanges {} elements, this side {}",
                peer_n, n
            ))
        };

        if self.id == 0 {
            self.send_words(&[n])?;
            self.send_words(own)?;
            let peer_n = self.recv_words(1)?[0];
            if peer_n != n {
                return Err(desync(peer_n));
            }
            self.recv_words(own.len())
        } else {
            let peer_n = self.recv_words(1)?[0];
            if peer_n != n {
                return Err(desync(peer_n));
            }
            let peer = self.recv_words(own.len())?;
            self.send_words(&[n])?;
            self.send_words(own)?;
            Ok(peer)
        }
    }
}

/// Transport role, fixed by the party id at construction.
enum Endpoint {
    /// Party 0 binds, listens and accepts.
    Listener { port: u16 },
    /// Party 1 connects out.
    Connector { host: String, port: u16 },
}

/// Lifecycle wrapper owning the TCP endpoint for one party.
///
/// Exactly one of the listener/connector roles exists per instance, keyed by
/// the party id, so the unused half cannot be touched. [`start`] is a no-op
/// when already started; [`end`] is idempotent.
///
/// [`start`]: TcpParty::start
/// [`end`]: TcpParty::end
pub struct TcpParty {
    id: PartyId,
    endpoint: Endpoint,
    listener: Option<TcpListener>,
    session: Option<Party<TcpChannel>>,
}

impl TcpParty {
    /// Configure a party. `host` is only used by party 1 (the connector);
    /// party 0 listens on all interfaces.
    pub fn new(id: PartyId, host: &str, port: u16) -> Result<Self, Error> {
        let endpoint = match id {
            0 => Endpoint::Listener { port },
            1 => Endpoint::Connector {
                host: host.to_string(),
                port,
            },
            _ => {
                return Err(Error::InvalidParameter(format!(
                    "party id must be 0 or 1 (got {})",
                    id
                )))
            }
        };

        Ok(Self {
            id,
            endpoint,
            listener: None,
            session: None,
        })
    }

    /// This party's id.
    pub fn id(&self) -> PartyId {
        self.id
    }

    /// Whether a session is up.
    pub fn is_started(&self) -> bool {
        self.session.is_some()
    }

    /// Establish the connection for this party's role. Blocks until the
    /// peer is reachable. Returns immediately if already started.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        let channel = match &self.endpoint {
            Endpoint::Listener { port } => {
                let (listener, channel) = tcp_channel::listen(*port)?;
                self.listener = Some(listener);
                channel
            }
            Endpoint::Connector { host, port } => tcp_channel::connect(host, *port)?,
        };

        self.session = Some(Party::new(self.id, channel)?);
        Ok(())
    }

    /// The live session. Fails if [`start`](TcpParty::start) has not run.
    pub fn party(&mut self) -> Result<&mut Party<TcpChannel>, Error> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::InvalidParameter("party not started".to_string()))
    }

    /// Close the connection and, for party 0, the listening socket.
    pub fn end(&mut self) {
        self.session = None;
        self.listener = None;
    }
}
