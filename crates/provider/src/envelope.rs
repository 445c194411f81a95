use chrono::{DateTime, Utc};
use serde::Deserialize;
use ticks_core::Tick;

use crate::error::ProviderError;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Vec<TradeEvent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TradeEvent {
    pub p: f64,
    pub s: String,
    pub t: i64,
    pub v: f64,
    #[serde(default)]
    pub x: Option<String>,
}

/// Parses one text frame into normalized ticks. Envelopes whose `type` is
/// not `"trade"` yield no ticks and are not an error.
pub(crate) fn decode_frame(text: &str) -> Result<Vec<Tick>, ProviderError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if envelope.kind != "trade" {
        return Ok(Vec::new());
    }

    Ok(envelope
        .data
        .into_iter()
        .map(|event| {
            let ts = DateTime::<Utc>::from_timestamp_millis(event.t).unwrap_or_default();
            Tick {
                symbol: event.s,
                ts,
                price: event.p,
                size: event.v,
                exchange: event.x.unwrap_or_default(),
                src_id: "finnhub".to_string(),
            }
            .normalize()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_non_trade_envelopes() {
        let frame = r#"{"type":"ping"}"#;
        assert_eq!(decode_frame(frame).unwrap(), Vec::new());
    }

    #[test]
    fn decodes_trade_envelope_into_normalized_ticks() {
        let frame = r#"{"type":"trade","data":[{"p":189.5,"s":"aapl","t":1700000000000,"v":10.0,"x":"N"}]}"#;
        let ticks = decode_frame(frame).unwrap();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].symbol, "AAPL");
        assert_eq!(ticks[0].exchange, "N");
        assert_eq!(ticks[0].src_id, "finnhub");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(decode_frame("not json").is_err());
    }
}
