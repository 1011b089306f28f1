//! The closed error taxonomy for the ASTM engine, per `spec.md` §7.

use thiserror::Error;

/// All errors the framing codec, link state machine, and client/server
/// engines can produce.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The envelope violates the STX/CRLF/digit/terminator rules.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A frame is missing its `CR ETX` / `ETB` trailer.
    #[error("incomplete frame: {0}")]
    IncompleteFrame(String),

    /// The transmitted checksum does not match the computed one.
    #[error("checksum mismatch: expected {expected}, computed {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// `split` was asked for a chunk size below the envelope overhead.
    #[error("invalid chunk size {0}, minimum is {min}", min = crate::constants::MIN_CHUNK_SIZE)]
    InvalidChunkSize(usize),

    /// The record-flow state machine rejected a record type transition.
    #[error("invalid record order: {prev:?} -> {next}")]
    InvalidRecordOrder { prev: Option<u8>, next: u8 },

    /// A role received a token it must never receive in its protocol role.
    #[error("unexpected token for this role: {0}")]
    UnexpectedToken(String),

    /// A token was received while the engine was in an incompatible state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The retry budget on ENQ, or the header frame itself, was exhausted/refused.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The inactivity timer expired.
    #[error("timeout waiting for peer")]
    Timeout,

    /// The dispatcher (or, on the client side, the application) refused a record.
    #[error("not accepted: {0}")]
    NotAccepted(String),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
