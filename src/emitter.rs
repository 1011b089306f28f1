//! The record producer collaborator contract and its buffering adapter, per
//! `spec.md` §4.4 and the "pull-with-ack" redesign note in §9.
//!
//! Grounded in `original_source/astm/client.py::Emitter`: a Python generator
//! that `yield`s records and receives `True`/`False`/`GeneratorExit` back
//! through `send()`/`throw()`. Rust has no stackful coroutines, so this is
//! reworked into an explicit pull trait: the client engine calls `next()`,
//! passing back the outcome of the previous record's transmission, and gets
//! either another record or `ProducerOutcome::End`. `StopIteration` becomes
//! the `End` variant instead of a control-flow exception.

use async_trait::async_trait;

use crate::error::Result;
use crate::flow::{FlowMap, RecordFlow};
use crate::record::{record_type, Record};

/// What a [`RecordProducer`] hands back on each pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducerOutcome {
    /// One record to send next.
    Record(Record),
    /// No more records; the client engine should send `EOT`.
    End,
}

/// A source of outbound records, pulled one at a time by the client engine.
///
/// `feedback` reports whether the *previous* record this producer returned
/// was acknowledged (`Some(true)`), rejected (`Some(false)`), or — on the
/// very first call — absent (`None`, nothing has been sent yet). Mirrors
/// the original `Emitter._get_record`'s `status = yield record` round trip,
/// where `status` held the peer's `ACK`/`NAK` response to the prior send.
#[async_trait]
pub trait RecordProducer: Send {
    async fn next(&mut self, feedback: Option<bool>) -> Result<ProducerOutcome>;

    /// Releases any resources this producer holds. Invoked by the client
    /// engine on every exit from its transfer loop — normal completion,
    /// a rejected/timed-out record, or a producer error — mirroring the
    /// original `Emitter.close()`, called from the generator's `finally`
    /// block on `GeneratorExit`.
    async fn close(&mut self);
}

/// Adapts a plain in-memory list of records into a [`RecordProducer`],
/// tracking record-flow admissibility and the running sequence number the
/// way `Emitter` does via its own `RecordsStateMachine` instance.
///
/// Grounded in `Emitter.__init__`'s `self.records_sm`, `self._last_seq`, and
/// the buffering fields `self.bulk_mode`/`self.chunk_size` (the latter two
/// are handled by the codec layer here, not the producer, since chunking is
/// purely a function of one record's encoded size).
pub struct VecProducer {
    records: std::vec::IntoIter<Record>,
    flow: RecordFlow,
    /// Set once a record has been rejected by `feedback == Some(false)`;
    /// the same record is resent on the next pull rather than advanced past.
    pending_retry: Option<Record>,
}

impl VecProducer {
    pub fn new(records: Vec<Record>, flow_map: FlowMap) -> Self {
        Self {
            records: records.into_iter(),
            flow: RecordFlow::new(flow_map),
            pending_retry: None,
        }
    }
}

#[async_trait]
impl RecordProducer for VecProducer {
    async fn next(&mut self, feedback: Option<bool>) -> Result<ProducerOutcome> {
        if feedback == Some(false) {
            if let Some(record) = self.pending_retry.clone() {
                return Ok(ProducerOutcome::Record(record));
            }
        }
        self.pending_retry = None;

        let record = match self.records.next() {
            Some(record) => record,
            None => return Ok(ProducerOutcome::End),
        };
        let ty = record_type(&record)?;
        self.flow.advance(ty)?;
        self.pending_retry = Some(record.clone());
        Ok(ProducerOutcome::Record(record))
    }

    async fn close(&mut self) {
        self.pending_retry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    fn header() -> Record {
        vec![Field::text("H")]
    }

    fn terminator() -> Record {
        vec![Field::text("L"), Field::text("1"), Field::text("N")]
    }

    #[tokio::test]
    async fn yields_records_then_ends() {
        let mut producer = VecProducer::new(vec![header(), terminator()], FlowMap::default());
        assert_eq!(
            producer.next(None).await.unwrap(),
            ProducerOutcome::Record(header())
        );
        assert_eq!(
            producer.next(Some(true)).await.unwrap(),
            ProducerOutcome::Record(terminator())
        );
        assert_eq!(producer.next(Some(true)).await.unwrap(), ProducerOutcome::End);
    }

    #[tokio::test]
    async fn rejection_resends_same_record() {
        let mut producer = VecProducer::new(vec![header(), terminator()], FlowMap::default());
        assert_eq!(
            producer.next(None).await.unwrap(),
            ProducerOutcome::Record(header())
        );
        assert_eq!(
            producer.next(Some(false)).await.unwrap(),
            ProducerOutcome::Record(header())
        );
        assert_eq!(
            producer.next(Some(true)).await.unwrap(),
            ProducerOutcome::Record(terminator())
        );
    }

    #[tokio::test]
    async fn out_of_order_record_is_rejected() {
        let mut producer = VecProducer::new(vec![terminator()], FlowMap::default());
        assert!(producer.next(None).await.is_err());
    }
}
