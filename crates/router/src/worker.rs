use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::processor::Processor;
use crate::shard::ShardReceiver;

/// Spawns one task per shard receiver. Because each shard has exactly one
/// consumer, messages for a given symbol are always processed serially and
/// in order within that shard.
pub fn start_workers(
    cancel: CancellationToken,
    shards: Vec<ShardReceiver>,
    processor: Arc<dyn Processor>,
) -> Vec<JoinHandle<()>> {
    shards
        .into_iter()
        .enumerate()
        .map(|(idx, shard)| {
            let cancel = cancel.clone();
            let processor = processor.clone();
            tokio::spawn(async move {
                loop {
                    let received = tokio::select! {
                        msg = shard.recv_async() => msg,
                        _ = cancel.cancelled() => {
                            debug!(shard = idx, "worker observed cancellation");
                            return;
                        }
                    };

                    let msg = match received {
                        Ok(msg) => msg,
                        Err(_) => {
                            debug!(shard = idx, "shard channel closed, worker exiting");
                            return;
                        }
                    };

                    if let Err(err) = processor.process(&cancel, &msg).await {
                        warn!(shard = idx, %err, "processor returned an error");
                    }
                }
            })
        })
        .collect()
}
