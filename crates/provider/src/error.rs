use thiserror::Error;

/// A non-fatal condition observed while reading the provider's feed.
/// Reported on the error channel; never terminates the read loop.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to decode provider envelope: {0}")]
    Decode(String),
    #[error("failed to subscribe to symbol {symbol}: {reason}")]
    Subscribe { symbol: String, reason: String },
    #[error("websocket transport error: {0}")]
    Transport(String),
}
