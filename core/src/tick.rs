use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A normalized market trade event.
///
/// `Tick` is the canonical record produced by a [`Provider`](../ticks_provider)
/// and carried unchanged through publish; the broker layer attaches provenance
/// separately via [`crate::TickMsg`] rather than mutating this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub symbol: String,
    pub ts: DateTime<Utc>,
    pub price: f64,
    pub size: f64,
    pub exchange: String,
    pub src_id: String,
}

/// Invariant violated by [`Tick::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    #[error("symbol is empty")]
    EmptySymbol,
    #[error("timestamp is unset")]
    BadTimestamp,
    #[error("price is negative")]
    BadPrice,
    #[error("size is negative")]
    BadSize,
}

impl Tick {
    /// Normalizes symbol casing and fills in a missing timestamp.
    ///
    /// Idempotent: `t.clone().normalize().normalize() == t.clone().normalize()`.
    pub fn normalize(mut self) -> Self {
        self.symbol = self.symbol.trim().to_uppercase();
        if self.ts.timestamp_millis() == 0 {
            self.ts = Utc::now();
        }
        self
    }

    /// Checks the record against the invariants documented on this type.
    pub fn validate(&self) -> Result<(), TickError> {
        if self.symbol.trim().is_empty() {
            return Err(TickError::EmptySymbol);
        }
        if self.ts.timestamp_millis() == 0 {
            return Err(TickError::BadTimestamp);
        }
        if self.price < 0.0 {
            return Err(TickError::BadPrice);
        }
        if self.size < 0.0 {
            return Err(TickError::BadSize);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Tick {
        Tick {
            symbol: "  aapl ".into(),
            ts: Utc.timestamp_millis_opt(0).unwrap(),
            price: 189.5,
            size: 10.0,
            exchange: "NASDAQ".into(),
            src_id: "finnhub".into(),
        }
    }

    #[test]
    fn normalize_uppercases_and_trims_symbol() {
        let t = sample().normalize();
        assert_eq!(t.symbol, "AAPL");
    }

    #[test]
    fn normalize_fills_zero_timestamp_with_now() {
        let t = sample().normalize();
        assert!(t.ts.timestamp_millis() != 0);
    }

    #[test]
    fn normalize_is_idempotent_on_symbol() {
        let once = sample().normalize();
        let twice = once.clone().normalize();
        assert_eq!(once.symbol, twice.symbol);
    }

    #[test]
    fn validate_rejects_empty_symbol() {
        let mut t = sample().normalize();
        t.symbol = "   ".into();
        assert_eq!(t.validate(), Err(TickError::EmptySymbol));
    }

    #[test]
    fn validate_rejects_zero_timestamp() {
        let t = sample();
        assert_eq!(t.validate(), Err(TickError::BadTimestamp));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut t = sample().normalize();
        t.price = -1.0;
        assert_eq!(t.validate(), Err(TickError::BadPrice));
    }

    #[test]
    fn validate_rejects_negative_size() {
        let mut t = sample().normalize();
        t.size = -1.0;
        assert_eq!(t.validate(), Err(TickError::BadSize));
    }

    #[test]
    fn validate_accepts_well_formed_tick() {
        let t = sample().normalize();
        assert!(t.validate().is_ok());
    }
}
