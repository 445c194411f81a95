use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use ticks_core::TickMsg;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("processor rejected message: {0}")]
    Rejected(String),
}

/// Consumes a single routed message. Implementations are never called
/// concurrently for the same shard, but must be safe to call concurrently
/// across distinct shards (one instance is shared by every worker).
#[async_trait::async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, cancel: &CancellationToken, msg: &TickMsg) -> Result<(), ProcessError>;
}

/// Default processor: drops messages with an empty symbol after logging a
/// warning, and otherwise does nothing. Stands in for a real downstream
/// sink until one is wired up by the caller. An empty symbol is not a
/// processing failure worth surfacing to the worker loop's error path.
#[derive(Debug, Default)]
pub struct NoopProcessor;

#[async_trait::async_trait]
impl Processor for NoopProcessor {
    async fn process(&self, _cancel: &CancellationToken, msg: &TickMsg) -> Result<(), ProcessError> {
        if msg.tick.symbol.trim().is_empty() {
            warn!("dropping message with empty symbol");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticks_core::{BrokerMeta, Tick};

    fn msg_with_symbol(symbol: &str) -> TickMsg {
        TickMsg {
            tick: Tick {
                symbol: symbol.into(),
                ts: Utc::now(),
                price: 1.0,
                size: 1.0,
                exchange: String::new(),
                src_id: "finnhub".into(),
            },
            meta: BrokerMeta {
                partition: 0,
                offset: 0,
                key: symbol.as_bytes().to_vec(),
                broker_ts: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn accepts_non_empty_symbol() {
        let processor = NoopProcessor;
        let cancel = CancellationToken::new();
        assert!(processor.process(&cancel, &msg_with_symbol("AAPL")).await.is_ok());
    }

    #[tokio::test]
    async fn drops_empty_symbol_without_erroring() {
        let processor = NoopProcessor;
        let cancel = CancellationToken::new();
        assert!(processor.process(&cancel, &msg_with_symbol("")).await.is_ok());
    }
}
