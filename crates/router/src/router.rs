use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use ticks_core::TickMsg;

use crate::fnv::fnv1a_32;
use crate::shard::{shard_channel, ShardReceiver, ShardSender};

/// Fans incoming messages out across `n` bounded shard channels by a
/// deterministic hash of the symbol, so all messages for a symbol always
/// land on the same shard for a given `n`.
pub struct Router;

impl Router {
    /// Spawns the dispatch task and returns the shard receivers the caller
    /// hands to its worker pool. `on_drop` is invoked (with the dropped
    /// message) whenever a shard's queue is full; it is the caller's
    /// responsibility to turn that into a metric or a dead-letter write.
    pub fn start<F>(
        cancel: CancellationToken,
        mut input: mpsc::Receiver<TickMsg>,
        n: usize,
        q: usize,
        on_drop: F,
    ) -> Vec<ShardReceiver>
    where
        F: Fn(TickMsg) + Send + 'static,
    {
        let n = n.max(1);
        let mut senders: Vec<ShardSender> = Vec::with_capacity(n);
        let mut receivers: Vec<ShardReceiver> = Vec::with_capacity(n);
        for _ in 0..n {
            let (tx, rx) = shard_channel(q);
            senders.push(tx);
            receivers.push(rx);
        }

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    msg = input.recv() => msg,
                    _ = cancel.cancelled() => None,
                };

                let Some(msg) = next else {
                    break;
                };

                let idx = (fnv1a_32(msg.tick.symbol.as_bytes()) as usize) % n;
                if let Err(dropped) = senders[idx].try_send(msg) {
                    metrics::counter!("router_drops_total").increment(1);
                    on_drop(dropped);
                }
            }

            info!("router dispatch loop exiting, closing shard channels");
            drop(senders);
        });

        receivers
    }
}
