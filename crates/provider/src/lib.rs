//! Reconnecting WebSocket market-data provider.

mod backoff;
mod envelope;
mod error;
mod finnhub;

pub use error::ProviderError;
pub use finnhub::FinnhubProvider;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use ticks_core::Tick;

/// Capacity of the Tick output channel. Chosen so a brief downstream stall
/// does not force the provider to drop ticks before cancellation can unwind
/// the read loop.
pub const TICK_CHANNEL_CAPACITY: usize = 1024;

/// Capacity of the error-report channel. Errors are best-effort; a full
/// channel here drops the report rather than blocking the read loop.
pub const ERROR_CHANNEL_CAPACITY: usize = 16;

/// Produces a lazy, at-least-once stream of [`Tick`]s from an external feed.
///
/// Implementations own their reconnect/backoff state machine internally;
/// `start` returns once both output channels are wired and the background
/// task has been spawned, not once the connection has been established.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<Tick>, mpsc::Receiver<ProviderError>);
}
