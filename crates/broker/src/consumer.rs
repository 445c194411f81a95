use std::time::Duration;

use futures_util::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer as _, StreamConsumer};
use rdkafka::message::Message as _;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ticks_config::{BrokerConfig, ConsumerConfig};
use ticks_core::{BrokerMeta, Tick, TickMsg};

use crate::wire::TickWire;

const FETCH_ERROR_BACKOFF: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("failed to create consumer: {0}")]
    Init(#[from] rdkafka::error::KafkaError),
}

/// Reads committed broker messages and hands them to `out`, committing only
/// after the handoff succeeds. `out` is closed by the caller, not by this
/// type, once [`Consumer::run`] returns.
pub struct Consumer {
    inner: StreamConsumer,
}

impl Consumer {
    pub fn connect(broker: &BrokerConfig, cfg: &ConsumerConfig) -> Result<Self, ConsumerError> {
        let inner: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", broker.bootstrap_servers())
            .set("group.id", &cfg.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("fetch.min.bytes", cfg.min_bytes.to_string())
            .set("fetch.message.max.bytes", cfg.max_bytes.to_string())
            .set("fetch.wait.max.ms", cfg.max_wait_ms.to_string())
            .create()?;
        inner.subscribe(&[broker.topic.as_str()])?;
        Ok(Self { inner })
    }

    pub async fn run(&self, cancel: CancellationToken, out: mpsc::Sender<TickMsg>) {
        let mut stream = self.inner.stream();
        loop {
            let next = tokio::select! {
                msg = stream.next() => msg,
                _ = cancel.cancelled() => {
                    info!("consumer cancelled");
                    return;
                }
            };

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(err)) => {
                    warn!(%err, "consumer fetch error, backing off");
                    metrics::counter!("consumer_fetch_errors_total").increment(1);
                    tokio::select! {
                        _ = tokio::time::sleep(FETCH_ERROR_BACKOFF) => {}
                        _ = cancel.cancelled() => return,
                    }
                    continue;
                }
                None => {
                    info!("consumer stream ended");
                    return;
                }
            };

            let payload = message.payload().unwrap_or_default();
            let decoded: Result<TickWire, _> = serde_json::from_slice(payload);

            match decoded {
                Ok(wire) => {
                    let tick: Tick = wire.into();
                    let meta = BrokerMeta {
                        partition: message.partition(),
                        offset: message.offset(),
                        key: message.key().unwrap_or_default().to_vec(),
                        broker_ts: message
                            .timestamp()
                            .to_millis()
                            .and_then(chrono::DateTime::from_timestamp_millis)
                            .unwrap_or_default(),
                    };
                    let tick_msg = TickMsg { tick, meta };

                    let accepted = tokio::select! {
                        res = out.send(tick_msg) => res.is_ok(),
                        _ = cancel.cancelled() => false,
                    };

                    if accepted {
                        if let Err(err) = self.inner.commit_message(&message, CommitMode::Async) {
                            warn!(%err, "failed to commit message after handoff");
                        }
                        metrics::counter!("consumer_commits_total").increment(1);
                    } else {
                        debug!("downstream channel closed before commit; stopping consumer");
                        return;
                    }
                }
                Err(err) => {
                    warn!(
                        %err,
                        partition = message.partition(),
                        offset = message.offset(),
                        "malformed tick payload, committing to avoid poison loop"
                    );
                    metrics::counter!("consumer_decode_errors_total").increment(1);
                    if let Err(commit_err) = self.inner.commit_message(&message, CommitMode::Async)
                    {
                        warn!(%commit_err, "failed to commit malformed message");
                    }
                }
            }
        }
    }
}
