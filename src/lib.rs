//! An ASTM E1381 (low-level framing) / E1394-97 (record-level) protocol
//! engine for clinical laboratory instrument links.
//!
//! Three layers, bottom to top:
//! - [`codec`]/[`record`]/[`field`]: pure framing and field encode/decode.
//! - [`flow`]/[`link`]: the record-order and session state machines shared
//!   by both roles.
//! - [`client`]/[`server`]: the two engines applications actually drive,
//!   built over the [`transport::Transport`], [`emitter::RecordProducer`],
//!   [`dispatcher::RecordsDispatcher`] and [`scheduler::Scheduler`]
//!   collaborator contracts.

pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod emitter;
pub mod error;
pub mod field;
pub mod flow;
pub mod link;
pub mod record;
pub mod scheduler;
pub mod server;
pub mod timestamp;
pub mod transport;

pub use client::{ClientEngine, ClientSession};
pub use config::EngineConfig;
pub use dispatcher::{DispatchResult, RecordsDispatcher};
pub use emitter::{ProducerOutcome, RecordProducer, VecProducer};
pub use error::{ProtocolError, Result};
pub use field::{ComponentItem, Field};
pub use flow::{FlowMap, NextAllowed, RecordFlow};
pub use record::{record_type, Record};
pub use scheduler::{NullScheduler, Scheduler, TokioScheduler};
pub use server::{ConnectionHandler, ServerEngine, ServerSession};
pub use transport::Transport;
