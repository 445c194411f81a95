use crossbeam_channel::{bounded, Receiver, RecvError, Sender, TrySendError};
use tokio::task;
use ticks_core::TickMsg;

/// Sending half of one shard's bounded channel. Cloneable; the router holds
/// one clone per shard and uses only `try_send` so a full shard never
/// blocks dispatch.
#[derive(Clone)]
pub struct ShardSender {
    inner: Sender<TickMsg>,
}

impl ShardSender {
    fn new(inner: Sender<TickMsg>) -> Self {
        Self { inner }
    }

    /// Attempts to hand off a message without blocking. Returns the message
    /// back to the caller if the shard's queue is full or its worker has
    /// gone away, so the caller can route it to a drop callback.
    pub fn try_send(&self, msg: TickMsg) -> Result<(), TickMsg> {
        match self.inner.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(msg)) => Err(msg),
            Err(TrySendError::Disconnected(msg)) => Err(msg),
        }
    }
}

/// Receiving half of one shard's bounded channel, with an async-friendly
/// `recv_async` that bridges the synchronous `crossbeam_channel::Receiver`
/// onto a blocking task so a worker can `.await` it from a Tokio context.
#[derive(Clone)]
pub struct ShardReceiver {
    inner: Receiver<TickMsg>,
}

impl ShardReceiver {
    fn new(inner: Receiver<TickMsg>) -> Self {
        Self { inner }
    }

    pub async fn recv_async(&self) -> Result<TickMsg, RecvError> {
        let rx = self.inner.clone();
        task::spawn_blocking(move || rx.recv())
            .await
            .expect("shard receive task panicked")
    }
}

/// Builds one bounded shard channel pair with capacity `q`. `q == 0` is
/// valid and produces a rendezvous channel: `try_send` only succeeds while
/// a worker is already parked in `recv_async`.
pub fn shard_channel(q: usize) -> (ShardSender, ShardReceiver) {
    let (tx, rx) = bounded(q);
    (ShardSender::new(tx), ShardReceiver::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ticks_core::{BrokerMeta, Tick};

    fn sample_msg() -> TickMsg {
        TickMsg {
            tick: Tick {
                symbol: "AAPL".into(),
                ts: Utc::now(),
                price: 1.0,
                size: 1.0,
                exchange: String::new(),
                src_id: "finnhub".into(),
            },
            meta: BrokerMeta {
                partition: 0,
                offset: 0,
                key: b"AAPL".to_vec(),
                broker_ts: Utc::now(),
            },
        }
    }

    #[test]
    fn try_send_fails_when_full() {
        let (tx, _rx) = shard_channel(1);
        assert!(tx.try_send(sample_msg()).is_ok());
        assert!(tx.try_send(sample_msg()).is_err());
    }

    #[tokio::test]
    async fn recv_async_receives_sent_message() {
        let (tx, rx) = shard_channel(4);
        tx.try_send(sample_msg()).unwrap();
        let received = rx.recv_async().await.unwrap();
        assert_eq!(received.tick.symbol, "AAPL");
    }
}
