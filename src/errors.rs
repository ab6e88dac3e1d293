//! Error types shared by the whole crate.
//!
//! The library never exits the process on failure; every fallible operation
//! returns [`Error`] and the caller decides what is fatal. A
//! [`Error::Transport`] ends the current session for good: a partially
//! completed exchange leaves the peers desynchronized and there is no retry
//! protocol on top.

use std::io;
use thiserror::Error;

/// Errors produced by the sharing engines, the party transport and the
/// share persistence.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter is out of range (bit width, party id,
    /// unknown check name).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operand and triple vectors passed to a vector protocol disagree in
    /// length.
    #[error("length mismatch: expected {expected} elements, got {actual}")]
    LengthMismatch {
        /// Length dictated by the first operand.
        expected: usize,
        /// Offending length.
        actual: usize,
    },

    /// A socket-level operation failed. Fatal for the session.
    #[error("transport failure during {op}: {source}")]
    Transport {
        /// The operation that failed (`"bind"`, `"send share"`, ...).
        op: &'static str,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The peers disagree about the size of an exchange. Caller-induced;
    /// the session cannot be resumed.
    #[error("protocol desynchronization: {0}")]
    Desync(String),

    /// A share or triple file does not follow the text format.
    #[error("parse error at line {line}: {msg}")]
    Parse {
        /// 1-based line number within the file or block.
        line: usize,
        /// What went wrong.
        msg: String,
    },

    /// File open/read/write failure outside the protocol path.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Wrap an I/O error from the transport, tagging the failing operation.
    pub fn transport(op: &'static str, source: io::Error) -> Self {
        Error::Transport { op, source }
    }
}
