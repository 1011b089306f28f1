//! The server engine: drives a session as the receiving side, per
//! `spec.md` §4.5.
//!
//! Grounded in `original_source/astm/server.py::RequestHandler`: one
//! instance per accepted connection, owning a chunk reassembly buffer
//! (`self._chunks`) and the session state toggled between `init` and
//! `transfer` across `on_enq`/`on_eot`.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::codec::{decode_message, is_chunked_message, join};
use crate::config::EngineConfig;
use crate::constants::{Separators, ACK, EOT, NAK};
use crate::dispatcher::{dispatch_record, RecordsDispatcher};
use crate::error::{ProtocolError, Result};
use crate::link::{next_token, InboundToken, State};
use crate::scheduler::Scheduler;
use crate::transport::Transport;

/// One accepted connection's session handler, per spec.md §4.5.
///
/// Grounded in `RequestHandler.__init__`'s `self._chunks = []` and
/// `self._is_transfer_state = False`; `is_chunked_transfer` here plays the
/// same role as the original's lazily-discovered
/// `self.is_chunked_transfer`, set the first time a frame in a message is
/// observed to be `ETB`-terminated.
pub struct ServerSession {
    config: EngineConfig,
    sep: Separators,
    state: State,
    chunks: Vec<Vec<u8>>,
    connection_id: Uuid,
}

impl ServerSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sep: Separators::default(),
            state: State::Init,
            chunks: Vec::new(),
            connection_id: Uuid::new_v4(),
        }
    }

    async fn read_token(
        &self,
        transport: &mut dyn Transport,
        scheduler: &dyn Scheduler,
    ) -> Result<Option<InboundToken>> {
        match self.config.timeout {
            Some(duration) => {
                tokio::select! {
                    token = next_token(transport, self.state) => Ok(Some(token?)),
                    _ = scheduler.sleep(duration) => Ok(None),
                }
            }
            None => Ok(Some(next_token(transport, self.state).await?)),
        }
    }

    /// Runs the receive loop for one connection until the peer closes it
    /// or a timeout/protocol violation ends the session.
    pub async fn run(
        &mut self,
        transport: &mut dyn Transport,
        dispatcher: &Arc<dyn RecordsDispatcher>,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        log::info!("[{}] session started", self.connection_id);
        loop {
            let token = match self.read_token(transport, scheduler).await? {
                Some(token) => token,
                None => {
                    log::warn!("[{}] inactivity timeout, closing connection", self.connection_id);
                    return Err(ProtocolError::Timeout);
                }
            };
            match token {
                InboundToken::Enq => self.on_enq(transport).await?,
                InboundToken::Message(msg) => self.on_message(transport, &msg, dispatcher).await?,
                InboundToken::Eot => {
                    self.on_eot();
                    log::info!("[{}] session ended", self.connection_id);
                    return Ok(());
                }
                InboundToken::Ack | InboundToken::Nak => {
                    log::error!("[{}] unexpected ACK/NAK from peer", self.connection_id);
                    return Err(ProtocolError::NotAccepted(
                        "server does not expect ACK/NAK".to_string(),
                    ));
                }
            }
        }
    }

    async fn on_enq(&mut self, transport: &mut dyn Transport) -> Result<()> {
        match self.state {
            State::Init => {
                self.state = State::Transfer;
                transport.write_all(&[ACK]).await?;
            }
            _ => {
                log::warn!("[{}] ENQ received outside init state, replying NAK", self.connection_id);
                transport.write_all(&[NAK]).await?;
            }
        }
        Ok(())
    }

    fn on_eot(&mut self) {
        self.state = State::Init;
        self.chunks.clear();
    }

    async fn on_message(
        &mut self,
        transport: &mut dyn Transport,
        msg: &[u8],
        dispatcher: &Arc<dyn RecordsDispatcher>,
    ) -> Result<()> {
        if self.state != State::Transfer {
            return Err(ProtocolError::NotAccepted(
                "received a message outside of the transfer state".to_string(),
            ));
        }

        let chunked = is_chunked_message(msg);
        if chunked {
            self.chunks.push(msg.to_vec());
            transport.write_all(&[ACK]).await?;
            return Ok(());
        }

        let assembled = if self.chunks.is_empty() {
            msg.to_vec()
        } else {
            self.chunks.push(msg.to_vec());
            let joined = join(&self.chunks);
            self.chunks.clear();
            match joined {
                Ok(joined) => joined,
                Err(_) => {
                    transport.write_all(&[NAK]).await?;
                    return Ok(());
                }
            }
        };

        let decoded = decode_message(&assembled, self.sep, &self.config.encoding);
        let records = match decoded {
            Ok((_, records, _)) => records,
            Err(e) => {
                log::warn!("[{}] rejecting malformed message: {}", self.connection_id, e);
                transport.write_all(&[NAK]).await?;
                return Ok(());
            }
        };

        for record in records {
            if let Err(e) = dispatch_record(dispatcher.as_ref(), record).await {
                log::warn!("[{}] dispatcher rejected record: {}", self.connection_id, e);
                transport.write_all(&[NAK]).await?;
                return Ok(());
            }
        }
        transport.write_all(&[ACK]).await?;
        Ok(())
    }
}

/// Builds fresh [`ServerSession`]s for accepted connections, sharing one
/// dispatcher and scheduler, mirroring `astm.server.Server`'s per-accept
/// construction of a `RequestHandler`.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    async fn handle(&self, transport: &mut dyn Transport) -> Result<()>;
}

pub struct ServerEngine<S: Scheduler> {
    config: EngineConfig,
    dispatcher: Arc<dyn RecordsDispatcher>,
    scheduler: S,
}

impl<S: Scheduler> ServerEngine<S> {
    pub fn new(config: EngineConfig, dispatcher: Arc<dyn RecordsDispatcher>, scheduler: S) -> Self {
        Self {
            config,
            dispatcher,
            scheduler,
        }
    }
}

#[async_trait]
impl<S: Scheduler> ConnectionHandler for ServerEngine<S> {
    async fn handle(&self, transport: &mut dyn Transport) -> Result<()> {
        let mut session = ServerSession::new(self.config.clone());
        session.run(transport, &self.dispatcher, &self.scheduler).await
    }
}
