use chrono::{DateTime, Utc};

use crate::Tick;

/// Broker provenance attached to a [`Tick`] once it has been read back off the
/// partitioned log. Never produced by the provider or publisher; only the
/// consumer constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerMeta {
    pub partition: i32,
    pub offset: i64,
    pub key: Vec<u8>,
    pub broker_ts: DateTime<Utc>,
}

/// A [`Tick`] paired with the broker metadata it was read back with.
#[derive(Debug, Clone, PartialEq)]
pub struct TickMsg {
    pub tick: Tick,
    pub meta: BrokerMeta,
}
