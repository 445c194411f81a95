use std::time::{Duration, Instant};

use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use thiserror::Error;
use ticks_config::BrokerConfig;
use ticks_core::Tick;

use crate::wire::TickWire;

const METADATA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Coarse classification of a broker-side publish failure, used for both
/// the error variant and the `category` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishErrorCategory {
    Retriable,
    NonRetriable,
    Timeout,
}

impl PublishErrorCategory {
    fn as_label(self) -> &'static str {
        match self {
            Self::Retriable => "retriable",
            Self::NonRetriable => "non_retriable",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize tick: {0}")]
    Marshal(#[from] serde_json::Error),
    #[error("broker rejected publish ({category:?}): {source}")]
    Broker {
        category: PublishErrorCategory,
        source: KafkaError,
    },
}

/// Emits one broker message per [`Tick`], keyed by symbol, with
/// `acks=all` and a per-call round trip (no internal retry queue beyond
/// what `rdkafka`'s producer itself performs).
pub struct Publisher {
    producer: FutureProducer,
    topic: String,
}

impl Publisher {
    /// Builds the producer and performs a metadata-fetch handshake against
    /// the configured brokers. A failed handshake fails construction.
    pub async fn connect(cfg: &BrokerConfig) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", cfg.bootstrap_servers())
            .set("acks", "all")
            .set("compression.type", "lz4")
            .set("linger.ms", "5")
            .set("batch.size", "1048576")
            .set("message.timeout.ms", "10000")
            .create()
            .map_err(|e| PublishError::Broker {
                category: PublishErrorCategory::NonRetriable,
                source: e,
            })?;

        producer
            .client()
            .fetch_metadata(None, METADATA_FETCH_TIMEOUT)
            .map_err(|e| {
                metrics::counter!("broker_connect_failures_total").increment(1);
                PublishError::Broker {
                    category: PublishErrorCategory::NonRetriable,
                    source: e,
                }
            })?;
        metrics::counter!("broker_connect_successes_total").increment(1);

        Ok(Self {
            producer,
            topic: cfg.topic.clone(),
        })
    }

    pub async fn publish(&self, tick: &Tick) -> Result<(), PublishError> {
        let started = Instant::now();
        let wire = TickWire::from(tick);
        let payload = match serde_json::to_vec(&wire) {
            Ok(payload) => payload,
            Err(err) => {
                metrics::histogram!("publish_latency_seconds")
                    .record(started.elapsed().as_secs_f64());
                metrics::counter!("publish_failures_total", "category" => "marshal").increment(1);
                return Err(PublishError::Marshal(err));
            }
        };
        let key = tick.symbol.as_bytes();

        let record = FutureRecord::to(&self.topic)
            .payload(&payload)
            .key(key)
            .timestamp(tick.ts.timestamp_millis())
            .headers(
                rdkafka::message::OwnedHeaders::new()
                    .insert(rdkafka::message::Header {
                        key: "content-type",
                        value: Some("application/json"),
                    })
                    .insert(rdkafka::message::Header {
                        key: "src_id",
                        value: Some(tick.src_id.as_str()),
                    })
                    .insert(rdkafka::message::Header {
                        key: "normalize_ver",
                        value: Some("v1"),
                    }),
            );

        let result = self.producer.send(record, Timeout::After(SEND_TIMEOUT)).await;
        metrics::histogram!("publish_latency_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(_) => {
                metrics::counter!("publish_successes_total").increment(1);
                Ok(())
            }
            Err((err, _)) => {
                let category = classify(&err);
                metrics::counter!("publish_failures_total", "category" => category.as_label())
                    .increment(1);
                Err(PublishError::Broker {
                    category,
                    source: err,
                })
            }
        }
    }
}

fn classify(err: &KafkaError) -> PublishErrorCategory {
    classify_message(&err.to_string())
}

/// Pure substring classification, split out from [`classify`] so the rule
/// set is testable without constructing a real `KafkaError`.
fn classify_message(message: &str) -> PublishErrorCategory {
    let message = message.to_lowercase();
    if message.contains("timed out") || message.contains("timeout") {
        PublishErrorCategory::Timeout
    } else if message.contains("queue full") || message.contains("retry") {
        PublishErrorCategory::Retriable
    } else {
        PublishErrorCategory::NonRetriable
    }
}

#[cfg(test)]
mod classify_tests {
    use super::*;

    #[test]
    fn classifies_timeout_messages() {
        assert_eq!(
            classify_message("Message timed out"),
            PublishErrorCategory::Timeout
        );
        assert_eq!(
            classify_message("Local: Timed out"),
            PublishErrorCategory::Timeout
        );
    }

    #[test]
    fn classifies_retriable_messages() {
        assert_eq!(
            classify_message("Local: Queue full"),
            PublishErrorCategory::Retriable
        );
        assert_eq!(
            classify_message("Broker: Request retry"),
            PublishErrorCategory::Retriable
        );
    }

    #[test]
    fn classifies_everything_else_as_non_retriable() {
        assert_eq!(
            classify_message("Broker: Topic authorization failed"),
            PublishErrorCategory::NonRetriable
        );
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(
            classify_message("MESSAGE TIMED OUT"),
            PublishErrorCategory::Timeout
        );
    }
}
