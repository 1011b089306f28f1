//! The records dispatcher collaborator contract, per `spec.md` §4.6.
//!
//! Grounded in `original_source/astm/server.py::BaseRecordsDispatcher`
//! (its `dispatch = {'H': self.on_header, ...}` map and `wrappers` dict)
//! and in the teacher's `docs/lab_machine_middleware.rs` sketch of an
//! `async_trait`-based handler surface for lab messages.

use async_trait::async_trait;

use crate::constants::{
    COMMENT_RECORD, HEADER_RECORD, MANUFACTURER_RECORD, ORDER_RECORD, PATIENT_RECORD,
    RESULT_RECORD, SCIENTIFIC_RECORD, TERMINATOR_RECORD,
};
use crate::record::{record_type, Record};

/// The result of handing one record to the dispatcher. An `Err` causes the
/// server engine to reply `NAK` for the frame that carried it.
pub type DispatchResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Consumes decoded records handed to it by the server engine, one at a
/// time, in the order they were received within a message.
///
/// Implementations are free to be stateful across a session (e.g.
/// correlating a Result record back to the Patient/Order that preceded
/// it); per `spec.md` §5, that correlation state is the dispatcher's own
/// responsibility, not the engine's. A dispatcher shared across
/// connections (`Arc<dyn RecordsDispatcher>`) must make its own methods
/// safe for concurrent invocation — hence the `Sync` bound and `&self`
/// (never `&mut self`) receivers here.
#[async_trait]
pub trait RecordsDispatcher: Send + Sync {
    async fn dispatch_header(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_patient(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_order(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_result(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_comment(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_scientific(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_manufacturer_info(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    async fn dispatch_terminator(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    /// Fallback for record type codes not covered above, including
    /// vendor-defined codes.
    async fn dispatch_unknown(&self, record: &Record) -> DispatchResult {
        let _ = record;
        Ok(())
    }

    /// Translates a raw decoded record into whatever shape this
    /// dispatcher prefers before dispatching it. Defaults to identity,
    /// matching `BaseRecordsDispatcher.wrap` when no `wrappers` entry
    /// exists for the record's type code.
    fn wrap(&self, record: Record) -> Record {
        record
    }
}

/// Routes one decoded `record` to the matching handler on `dispatcher`,
/// mirroring `BaseRecordsDispatcher.__call__`'s `self.dispatch.get(record[0],
/// self.on_unknown)(...)` lookup.
pub async fn dispatch_record(dispatcher: &dyn RecordsDispatcher, record: Record) -> DispatchResult {
    let ty = record_type(&record).unwrap_or(0);
    let record = dispatcher.wrap(record);
    match ty {
        HEADER_RECORD => dispatcher.dispatch_header(&record).await,
        PATIENT_RECORD => dispatcher.dispatch_patient(&record).await,
        ORDER_RECORD => dispatcher.dispatch_order(&record).await,
        RESULT_RECORD => dispatcher.dispatch_result(&record).await,
        COMMENT_RECORD => dispatcher.dispatch_comment(&record).await,
        SCIENTIFIC_RECORD => dispatcher.dispatch_scientific(&record).await,
        MANUFACTURER_RECORD => dispatcher.dispatch_manufacturer_info(&record).await,
        TERMINATOR_RECORD => dispatcher.dispatch_terminator(&record).await,
        _ => dispatcher.dispatch_unknown(&record).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingDispatcher {
        headers: AtomicUsize,
        unknown: AtomicUsize,
    }

    #[async_trait]
    impl RecordsDispatcher for CountingDispatcher {
        async fn dispatch_header(&self, _record: &Record) -> DispatchResult {
            self.headers.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn dispatch_unknown(&self, _record: &Record) -> DispatchResult {
            self.unknown.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn routes_by_type_code() {
        let dispatcher = CountingDispatcher {
            headers: AtomicUsize::new(0),
            unknown: AtomicUsize::new(0),
        };
        dispatch_record(&dispatcher, vec![Field::text("H")])
            .await
            .unwrap();
        dispatch_record(&dispatcher, vec![Field::text("Q")])
            .await
            .unwrap();
        assert_eq!(dispatcher.headers.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.unknown.load(Ordering::SeqCst), 1);
    }
}
