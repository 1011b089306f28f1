//! The shared link-layer state machine: session states and the
//! tokenizer/frame-delimiter policy governing what the transport read loop
//! waits for in each state. Per `spec.md` §4.2.
//!
//! Grounded in `original_source/astm/proto.py`'s `STATE` namedtuple and its
//! `terminator` toggling between `1` (one byte) and `[CRLF, EOT]`
//! (message-or-EOT) across `set_init_state`/`set_opened_state`/
//! `set_transfer_state`.

pub mod token;

pub use token::{classify, InboundToken};

use crate::constants::EOT;
use crate::error::{ProtocolError, Result};
use crate::transport::Transport;

/// Reads the next inbound token according to the tokenizer policy for
/// `state`: a single control byte outside `Transfer`, or either `EOT` or a
/// `CRLF`-terminated message while `Transfer`. Per `spec.md` §4.2.
pub async fn next_token(transport: &mut dyn Transport, state: State) -> Result<InboundToken> {
    match state.terminator() {
        Terminator::SingleByte => {
            let byte = transport
                .read_byte()
                .await?
                .ok_or_else(connection_closed)?;
            classify(&[byte])
        }
        Terminator::ByteOrCrlfMessage => {
            let first = transport
                .read_byte()
                .await?
                .ok_or_else(connection_closed)?;
            if first == EOT {
                return Ok(InboundToken::Eot);
            }
            let mut buf = vec![first];
            transport
                .read_until_crlf(&mut buf)
                .await?
                .ok_or_else(connection_closed)?;
            classify(&buf)
        }
    }
}

fn connection_closed() -> ProtocolError {
    ProtocolError::Io(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "connection closed by peer",
    ))
}

/// The session state shared by both client and server link handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Neutral: no session is open. Ready to send/receive `ENQ`.
    Init,
    /// Awaiting a single `ACK`/`NAK` control byte (client-only): right
    /// after sending `ENQ`, and after every subsequent frame the client
    /// sends. The client never reads a `CRLF`-terminated message back, so
    /// it stays on the single-byte tokenizer policy throughout a send.
    Opened,
    /// A session is open; messages are being exchanged.
    Transfer,
    /// Session is being torn down (`EOT` sent, awaiting reset to `Init`).
    Termination,
}

/// What the transport read loop should wait for while in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Wait for exactly one control byte (`ENQ`/`ACK`/`NAK`/`EOT`).
    SingleByte,
    /// Wait for either a single `EOT` byte, or a message terminated by
    /// `CRLF`.
    ByteOrCrlfMessage,
}

impl State {
    /// The tokenizer policy for this state, per `spec.md` §4.2.
    pub fn terminator(self) -> Terminator {
        match self {
            State::Init | State::Opened | State::Termination => Terminator::SingleByte,
            State::Transfer => Terminator::ByteOrCrlfMessage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_awaits_message_or_eot() {
        assert_eq!(State::Transfer.terminator(), Terminator::ByteOrCrlfMessage);
    }

    #[test]
    fn other_states_await_single_byte() {
        assert_eq!(State::Init.terminator(), Terminator::SingleByte);
        assert_eq!(State::Opened.terminator(), Terminator::SingleByte);
        assert_eq!(State::Termination.terminator(), Terminator::SingleByte);
    }
}
