//! Engine configuration, per `spec.md` §4.7's tunables (timeout, retry,
//! chunk size, bulk mode) and §4.3 (the record-flow table).
//!
//! Grounded in the teacher's `HisApiConfig::default()` pattern
//! (`services/his_client.rs`): a plain `Default`-derived settings struct
//! with a hand-written `impl Default` documenting the chosen defaults,
//! rather than a builder.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::flow::FlowMap;

/// Tunables shared by [`crate::client::ClientEngine`] and
/// [`crate::server::ServerEngine`].
///
/// `flow_map` is not `Serialize`/`Deserialize` (it can hold arbitrary
/// transition tables), so it is carried outside of the serde-derived
/// portion via [`EngineConfig::with_flow_map`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long to wait for the peer before treating the link as dead.
    /// `None` disables the inactivity timer entirely, matching
    /// `timeout=None` in the original.
    #[serde(with = "duration_secs_opt", default = "default_timeout")]
    pub timeout: Option<Duration>,
    /// How many times the client retries `ENQ` after a `NAK`/timeout
    /// before giving up, per spec.md §4.4 edge cases.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Maximum encoded message size before a message is split into
    /// chunks. `None` disables chunking.
    #[serde(default)]
    pub chunk_size: Option<usize>,
    /// When true, a producer's records are grouped into as few messages
    /// as the chunk size allows rather than one message per record.
    #[serde(default)]
    pub bulk_mode: bool,
    /// Session text encoding. Only `"latin-1"` is exercised by this
    /// implementation; other values pass through unchanged.
    #[serde(default = "default_encoding")]
    pub encoding: String,

    #[serde(skip)]
    flow_map: Option<FlowMap>,
}

fn default_timeout() -> Option<Duration> {
    Some(Duration::from_secs(20))
}

fn default_retry_attempts() -> u32 {
    0
}

fn default_encoding() -> String {
    "latin-1".to_string()
}

impl Default for EngineConfig {
    /// 20 second inactivity timeout, no retries, no chunking, no bulk
    /// mode, `latin-1` encoding, and the default record-flow table — the
    /// same defaults as `astm.client.Client`/`astm.server.Server` when
    /// constructed with no arguments.
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            chunk_size: None,
            bulk_mode: false,
            encoding: default_encoding(),
            flow_map: None,
        }
    }
}

impl EngineConfig {
    pub fn with_flow_map(mut self, flow_map: FlowMap) -> Self {
        self.flow_map = Some(flow_map);
        self
    }

    /// The configured flow map, or the default table if none was set.
    pub fn flow_map(&self) -> FlowMap {
        self.flow_map.clone().unwrap_or_default()
    }
}

mod duration_secs_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(|d| d.as_secs_f64()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<f64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.timeout, Some(Duration::from_secs(20)));
        assert_eq!(cfg.retry_attempts, 0);
        assert_eq!(cfg.chunk_size, None);
        assert!(!cfg.bulk_mode);
        assert_eq!(cfg.encoding, "latin-1");
    }

    #[test]
    fn roundtrips_through_json() {
        let cfg = EngineConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timeout, cfg.timeout);
        assert_eq!(back.retry_attempts, cfg.retry_attempts);
    }
}
