//! The record-flow state machine: enforces permitted record-type
//! transitions within a session, per `spec.md` §4.3.
//!
//! Grounded in `original_source/astm/client.py::RecordsStateMachine` and
//! its `DEFAULT_RECORDS_FLOW_MAP`, reworked from the original's
//! `'*'`-sentinel wildcard into an explicit enum variant.

use std::collections::HashMap;

use crate::constants::{
    COMMENT_RECORD, HEADER_RECORD, MANUFACTURER_RECORD, ORDER_RECORD, PATIENT_RECORD,
    RESULT_RECORD, SCIENTIFIC_RECORD, TERMINATOR_RECORD,
};
use crate::error::{ProtocolError, Result};

/// What is allowed to follow a given previous record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAllowed {
    /// Any record type is accepted.
    Any,
    /// Only these specific type codes are accepted.
    Only(Vec<u8>),
}

impl NextAllowed {
    fn allows(&self, next: u8) -> bool {
        match self {
            NextAllowed::Any => true,
            NextAllowed::Only(types) => types.contains(&next),
        }
    }
}

/// The record-flow transition table. `None` disables validation entirely
/// (pass-through), matching `mapping=None` in the original.
#[derive(Debug, Clone)]
pub struct FlowMap(Option<HashMap<Option<u8>, NextAllowed>>);

impl FlowMap {
    /// Disables record-order validation.
    pub fn none() -> Self {
        FlowMap(None)
    }

    /// A custom transition table.
    pub fn custom(map: HashMap<Option<u8>, NextAllowed>) -> Self {
        FlowMap(Some(map))
    }

    /// The table from `spec.md` §4.3, identical to the original's
    /// `DEFAULT_RECORDS_FLOW_MAP`.
    pub fn default_map() -> Self {
        let mut map = HashMap::new();
        map.insert(None, NextAllowed::Only(vec![HEADER_RECORD]));
        map.insert(
            Some(HEADER_RECORD),
            NextAllowed::Only(vec![
                COMMENT_RECORD,
                MANUFACTURER_RECORD,
                PATIENT_RECORD,
                TERMINATOR_RECORD,
            ]),
        );
        map.insert(
            Some(PATIENT_RECORD),
            NextAllowed::Only(vec![
                COMMENT_RECORD,
                MANUFACTURER_RECORD,
                ORDER_RECORD,
                TERMINATOR_RECORD,
            ]),
        );
        map.insert(
            Some(ORDER_RECORD),
            NextAllowed::Only(vec![
                COMMENT_RECORD,
                MANUFACTURER_RECORD,
                PATIENT_RECORD,
                ORDER_RECORD,
                RESULT_RECORD,
                TERMINATOR_RECORD,
            ]),
        );
        map.insert(
            Some(RESULT_RECORD),
            NextAllowed::Only(vec![
                COMMENT_RECORD,
                MANUFACTURER_RECORD,
                PATIENT_RECORD,
                ORDER_RECORD,
                RESULT_RECORD,
                SCIENTIFIC_RECORD,
                TERMINATOR_RECORD,
            ]),
        );
        map.insert(
            Some(SCIENTIFIC_RECORD),
            NextAllowed::Only(vec![
                COMMENT_RECORD,
                MANUFACTURER_RECORD,
                PATIENT_RECORD,
                ORDER_RECORD,
                RESULT_RECORD,
                SCIENTIFIC_RECORD,
                TERMINATOR_RECORD,
            ]),
        );
        map.insert(Some(COMMENT_RECORD), NextAllowed::Any);
        map.insert(Some(MANUFACTURER_RECORD), NextAllowed::Any);
        map.insert(Some(TERMINATOR_RECORD), NextAllowed::Only(vec![HEADER_RECORD]));
        FlowMap(Some(map))
    }

    pub fn is_acceptable(&self, prev: Option<u8>, next: u8) -> bool {
        match &self.0 {
            None => true,
            Some(map) => match map.get(&prev) {
                Some(allowed) => allowed.allows(next),
                None => false,
            },
        }
    }
}

impl Default for FlowMap {
    fn default() -> Self {
        FlowMap::default_map()
    }
}

/// Tracks the previously emitted/received record type and validates the
/// next one against a [`FlowMap`].
#[derive(Debug, Clone)]
pub struct RecordFlow {
    map: FlowMap,
    state: Option<u8>,
}

impl RecordFlow {
    pub fn new(map: FlowMap) -> Self {
        Self { map, state: None }
    }

    /// Validates and advances to `next`. On rejection the internal state is
    /// left unchanged so the caller may retry with a different record.
    pub fn advance(&mut self, next: u8) -> Result<()> {
        if !self.map.is_acceptable(self.state, next) {
            return Err(ProtocolError::InvalidRecordOrder {
                prev: self.state,
                next,
            });
        }
        self.state = Some(next);
        Ok(())
    }

    pub fn current(&self) -> Option<u8> {
        self.state
    }
}
