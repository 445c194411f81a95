use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticks_core::Tick;

/// On-the-wire JSON form of a [`Tick`]. `ts` is RFC 3339 with nanosecond
/// precision, matching what the original provider-side marshaler emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickWire {
    pub symbol: String,
    pub ts: DateTime<Utc>,
    pub price: f64,
    pub size: f64,
    pub exchange: String,
    pub src_id: String,
}

impl From<&Tick> for TickWire {
    fn from(tick: &Tick) -> Self {
        Self {
            symbol: tick.symbol.clone(),
            ts: tick.ts,
            price: tick.price,
            size: tick.size,
            exchange: tick.exchange.clone(),
            src_id: tick.src_id.clone(),
        }
    }
}

impl From<TickWire> for Tick {
    fn from(wire: TickWire) -> Self {
        Tick {
            symbol: wire.symbol,
            ts: wire.ts,
            price: wire.price,
            size: wire.size,
            exchange: wire.exchange,
            src_id: wire.src_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_through_json() {
        let tick = Tick {
            symbol: "AAPL".into(),
            ts: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            price: 189.5,
            size: 10.0,
            exchange: "N".into(),
            src_id: "finnhub".into(),
        };
        let wire: TickWire = (&tick).into();
        let json = serde_json::to_string(&wire).unwrap();
        let back: TickWire = serde_json::from_str(&json).unwrap();
        let roundtripped: Tick = back.into();
        assert_eq!(roundtripped, tick);
    }
}
