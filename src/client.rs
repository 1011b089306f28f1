//! The client engine: drives a session as the sending side, per
//! `spec.md` §4.4.
//!
//! Grounded in `original_source/astm/client.py::Client`'s `on_enq`/`on_ack`/
//! `on_nak`/`on_eot`/`on_message`/`on_timeout` handler methods, collapsed
//! here into two explicit phases (`establish_session`, `transfer_records`)
//! instead of callback dispatch, per the redesign note in `spec.md` §9.

use async_trait::async_trait;

use crate::codec::encode;
use crate::config::EngineConfig;
use crate::constants::{Separators, ACK, ENQ, EOT, NAK};
use crate::emitter::{ProducerOutcome, RecordProducer};
use crate::error::{ProtocolError, Result};
use crate::link::{next_token, InboundToken, State};
use crate::scheduler::Scheduler;
use crate::transport::Transport;

/// Drives one session over `transport`, pulling records from `producer`
/// until it signals [`ProducerOutcome::End`], per spec.md §4.4's 9 numbered
/// behaviors.
#[async_trait]
pub trait ClientSession {
    async fn run(
        &self,
        transport: &mut dyn Transport,
        producer: &mut dyn RecordProducer,
        scheduler: &dyn Scheduler,
    ) -> Result<()>;
}

pub struct ClientEngine {
    config: EngineConfig,
    sep: Separators,
}

impl ClientEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sep: Separators::default(),
        }
    }

    async fn read_token(
        &self,
        transport: &mut dyn Transport,
        scheduler: &dyn Scheduler,
        state: State,
    ) -> Result<Option<InboundToken>> {
        match self.config.timeout {
            Some(duration) => {
                tokio::select! {
                    token = next_token(transport, state) => Ok(Some(token?)),
                    _ = scheduler.sleep(duration) => Ok(None),
                }
            }
            None => Ok(Some(next_token(transport, state).await?)),
        }
    }

    /// Behaviors 1, 2, 6, 7: send `ENQ`, retry on `NAK`/timeout up to
    /// `retry_attempts` times, fail with `Rejected` once exhausted.
    async fn establish_session(
        &self,
        transport: &mut dyn Transport,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        let mut attempts: u32 = 0;
        loop {
            log::debug!("sending ENQ (attempt {})", attempts + 1);
            transport.write_all(&[ENQ]).await?;
            match self.read_token(transport, scheduler, State::Opened).await? {
                Some(InboundToken::Ack) => {
                    log::info!("session opened");
                    return Ok(());
                }
                Some(InboundToken::Nak) | None => {
                    attempts += 1;
                    log::warn!("ENQ rejected or timed out ({}/{})", attempts, self.config.retry_attempts);
                    if attempts > self.config.retry_attempts {
                        log::error!("giving up on ENQ after exhausting retry attempts");
                        return Err(ProtocolError::Rejected(
                            "peer rejected ENQ after exhausting retry attempts".to_string(),
                        ));
                    }
                }
                Some(_) => {
                    return Err(ProtocolError::NotAccepted(
                        "expected ACK or NAK in response to ENQ".to_string(),
                    ))
                }
            }
        }
    }

    /// Behaviors 3, 4, 5, 8, 9: request/send records until the producer
    /// ends the session, then send `EOT`. Per spec.md §5/§6, the producer
    /// is closed on every exit from this loop, successful or not — the
    /// work happens in `transfer_records_inner` so this wrapper can run
    /// `close()` unconditionally over its result.
    async fn transfer_records(
        &self,
        transport: &mut dyn Transport,
        producer: &mut dyn RecordProducer,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        let result = self
            .transfer_records_inner(transport, producer, scheduler)
            .await;
        producer.close().await;
        result
    }

    async fn transfer_records_inner(
        &self,
        transport: &mut dyn Transport,
        producer: &mut dyn RecordProducer,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        let mut seq: u32 = 1;
        let mut feedback: Option<bool> = None;

        loop {
            let outcome = match producer.next(feedback).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Per spec.md §9: change state first (the caller treats
                    // this return as session-over), then emit EOT, then
                    // let timers lapse with the connection.
                    transport.write_all(&[EOT]).await?;
                    return Err(e);
                }
            };
            let record = match outcome {
                ProducerOutcome::Record(record) => record,
                ProducerOutcome::End => break,
            };

            let chunks = encode(
                std::slice::from_ref(&record),
                self.sep,
                &self.config.encoding,
                self.config.chunk_size,
                (seq % 8) as u8,
            )?;
            seq += chunks.len() as u32;

            let mut rejected = false;
            for chunk in &chunks {
                transport.write_all(chunk).await?;
                // The client only ever reads a single ACK/NAK control byte
                // back in response to a sent frame — `ByteOrCrlfMessage`
                // tokenizing is the server's policy for inbound envelopes,
                // not the client's for inbound acknowledgements.
                match self.read_token(transport, scheduler, State::Opened).await? {
                    Some(InboundToken::Ack) => continue,
                    Some(InboundToken::Nak) => {
                        rejected = true;
                        break;
                    }
                    None => {
                        // Behavior 8: timeout outside `init` closes the link.
                        transport.write_all(&[EOT]).await?;
                        return Err(ProtocolError::Timeout);
                    }
                    Some(_) => {
                        return Err(ProtocolError::NotAccepted(
                            "expected ACK or NAK while transferring a message".to_string(),
                        ))
                    }
                }
            }
            feedback = Some(!rejected);
        }

        transport.write_all(&[EOT]).await?;
        Ok(())
    }
}

#[async_trait]
impl ClientSession for ClientEngine {
    async fn run(
        &self,
        transport: &mut dyn Transport,
        producer: &mut dyn RecordProducer,
        scheduler: &dyn Scheduler,
    ) -> Result<()> {
        self.establish_session(transport, scheduler).await?;
        self.transfer_records(transport, producer, scheduler).await
    }
}
