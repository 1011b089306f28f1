//! The byte transport collaborator contract, per `spec.md` §6. Deliberately
//! thin: the engines only ever need a byte in, a byte out, and a way to
//! read up to a `CRLF`.
//!
//! Grounded in the teacher's direct use of `AsyncReadExt`/`AsyncWriteExt`
//! over `tokio::net::TcpStream` in `services/autoquant_meril.rs` and
//! `services/bf6900_service.rs`; generalized here into a trait with a
//! blanket implementation so any `AsyncRead + AsyncWrite` (a real TCP
//! socket, a serial port, or an in-memory `tokio::io::duplex` in tests)
//! works without adapter boilerplate.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::constants::{CR, LF};

/// A full-duplex ordered byte stream. No length framing below the ASTM
/// envelope — callers read one byte at a time or up to a `CRLF`.
#[async_trait]
pub trait Transport: Send {
    /// Reads one byte. `Ok(None)` means the peer closed the connection.
    async fn read_byte(&mut self) -> std::io::Result<Option<u8>>;

    /// Appends bytes to `buf` until a `CR LF` pair has been read (the pair
    /// is included in `buf`). `Ok(None)` means the peer closed the
    /// connection before a `CRLF` was seen.
    async fn read_until_crlf(&mut self, buf: &mut Vec<u8>) -> std::io::Result<Option<()>>;

    async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()>;
}

#[async_trait]
impl<T> Transport for T
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        let n = AsyncReadExt::read(self, &mut byte).await?;
        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(byte[0]))
        }
    }

    async fn read_until_crlf(&mut self, buf: &mut Vec<u8>) -> std::io::Result<Option<()>> {
        loop {
            let mut byte = [0u8; 1];
            let n = AsyncReadExt::read(self, &mut byte).await?;
            if n == 0 {
                return Ok(None);
            }
            buf.push(byte[0]);
            if buf.len() >= 2 && buf[buf.len() - 2] == CR && buf[buf.len() - 1] == LF {
                return Ok(Some(()));
            }
        }
    }

    async fn write_all(&mut self, data: &[u8]) -> std::io::Result<()> {
        AsyncWriteExt::write_all(self, data).await
    }
}
