//! The single-byte-or-message discriminator read off the wire.
//!
//! Grounded in `original_source/astm/protocol.py::ASTMProtocol.dispatch`,
//! which branches on `data == ENQ / ACK / NAK / EOT` or `data.startswith(
//! STX)`. Reworked per `spec.md` §9 ("Dispatch on first byte") from
//! untyped byte comparisons into a sum type matched with `classify`.

use crate::constants::{ACK, ENQ, EOT, NAK, STX};
use crate::error::{ProtocolError, Result};

/// One inbound unit the link state machine may observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundToken {
    Enq,
    Ack,
    Nak,
    Eot,
    /// A complete ASTM message, `STX ... CRLF`, exactly as it arrived.
    Message(Vec<u8>),
}

/// Classifies one unit of inbound data. `data` must be either a single
/// control byte or a complete, CRLF-terminated message.
pub fn classify(data: &[u8]) -> Result<InboundToken> {
    match data {
        [ENQ] => Ok(InboundToken::Enq),
        [ACK] => Ok(InboundToken::Ack),
        [NAK] => Ok(InboundToken::Nak),
        [EOT] => Ok(InboundToken::Eot),
        _ if data.first() == Some(&STX) => Ok(InboundToken::Message(data.to_vec())),
        _ => Err(ProtocolError::MalformedFrame(format!(
            "unable to classify inbound data: {:?}",
            data
        ))),
    }
}
