//! # Two-party additive/boolean secret sharing with Beaver triples
//!
//! A synchronous two-party secure computation runtime: each party holds one
//! share of every secret, linear gates are local, and multiplication (AND)
//! consumes one precomputed Beaver triple plus a single exchange of masked
//! operands. The model is semi-honest; the transport is a plain blocking
//! byte stream between exactly two endpoints.
//!
//! [sharing] holds the protocol engines, [party] the symmetric exchange
//! façade, [channel_utils] the transports beneath it.
#![warn(missing_docs)]

pub mod channel_utils;
pub mod cli_utils;
pub mod errors;
pub mod party;
pub mod rand_utils;
pub mod runner;
pub mod share_io;
pub mod sharing;

pub use errors::Error;
pub use party::{Party, PartyId, TcpParty};
pub use sharing::{ArithmeticSharing, BeaverTriple, BooleanSharing};
