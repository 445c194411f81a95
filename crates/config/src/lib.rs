//! Environment-variable configuration for the ingestor and processor binaries.
//!
//! Every sub-config is loaded with a fail-fast `from_env` constructor: a
//! missing or malformed required variable produces a [`ConfigError`] naming
//! the offending variable rather than panicking or silently defaulting.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} has invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(v) => v.parse().map_err(|_| ConfigError::Invalid {
            name,
            reason: format!("expected an integer, got {v:?}"),
        }),
        Err(_) => Ok(default),
    }
}

/// WebSocket market-data provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_token: String,
    /// REST base URL for the provider. Not dialed by the WebSocket client;
    /// kept as its own required variable per spec, for collaborators that
    /// need the REST surface (e.g. symbol/metadata lookups).
    pub base_url: String,
    pub ws_url: String,
    pub symbols: Vec<String>,
    pub reconnect_base: Duration,
    pub reconnect_max: Duration,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_token = required("FINNHUB_TOKEN")?;
        let base_url = required("FINNHUB_BASE_URL")?;
        let ws_url = required("FINNHUB_WS_URL")?;
        let symbols_raw = required("FINNHUB_SYMBOLS")?;
        let symbols: Vec<String> = symbols_raw
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if symbols.is_empty() {
            return Err(ConfigError::Invalid {
                name: "FINNHUB_SYMBOLS",
                reason: "must contain at least one symbol".into(),
            });
        }
        let reconnect_base_ms = optional_u64("FINNHUB_RECONNECT_BASE_MS", 200)?;
        let reconnect_max_ms = optional_u64("FINNHUB_RECONNECT_MAX_MS", 5_000)?;
        Ok(Self {
            api_token,
            base_url,
            ws_url,
            symbols,
            reconnect_base: Duration::from_millis(reconnect_base_ms.max(1)),
            reconnect_max: Duration::from_millis(reconnect_max_ms.max(1)),
        })
    }
}

/// Kafka-compatible broker settings shared by the publisher and consumer.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub brokers: Vec<String>,
    pub topic: String,
}

impl BrokerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let brokers_raw = required("KAFKA_BROKERS")?;
        let brokers: Vec<String> = brokers_raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if brokers.is_empty() {
            return Err(ConfigError::Invalid {
                name: "KAFKA_BROKERS",
                reason: "must contain at least one broker address".into(),
            });
        }
        let topic = required("KAFKA_TICKS_TOPIC")?;
        Ok(Self { brokers, topic })
    }

    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }
}

/// Consumer-side fetch tuning, layered on top of [`BrokerConfig`].
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub group_id: String,
    pub min_bytes: u32,
    pub max_bytes: u32,
    pub max_wait_ms: u32,
}

impl ConsumerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let group_id = required("KAFKA_GROUP_ID")?;
        let min_bytes = optional_u64("KAFKA_MIN_BYTES", 1)? as u32;
        let max_bytes = optional_u64("KAFKA_MAX_BYTES", 1_048_576)? as u32;
        let max_wait_ms = optional_u64("KAFKA_MAX_WAIT_MS", 500)? as u32;
        Ok(Self {
            group_id,
            min_bytes,
            max_bytes,
            max_wait_ms,
        })
    }
}

/// Router and worker-pool sizing for the processor binary.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub num_workers: usize,
    pub queue_capacity: usize,
}

impl ProcessorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let num_workers = optional_u64("TICKS_NUM_WORKERS", 4)? as usize;
        let queue_capacity = optional_u64("TICKS_QUEUE_CAPACITY", 256)? as usize;
        Ok(Self {
            num_workers: num_workers.max(1),
            queue_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_provider_env() {
        for k in [
            "FINNHUB_TOKEN",
            "FINNHUB_WS_URL",
            "FINNHUB_BASE_URL",
            "FINNHUB_SYMBOLS",
            "FINNHUB_RECONNECT_BASE_MS",
            "FINNHUB_RECONNECT_MAX_MS",
        ] {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn provider_config_fails_fast_on_missing_token() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_provider_env();
        assert_eq!(
            ProviderConfig::from_env().unwrap_err(),
            ConfigError::Missing("FINNHUB_TOKEN")
        );
    }

    #[test]
    fn provider_config_parses_and_uppercases_symbols() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_provider_env();
        std::env::set_var("FINNHUB_TOKEN", "tok");
        std::env::set_var("FINNHUB_BASE_URL", "https://example.test");
        std::env::set_var("FINNHUB_WS_URL", "wss://example.test/ws");
        std::env::set_var("FINNHUB_SYMBOLS", "aapl, msft,");
        let cfg = ProviderConfig::from_env().unwrap();
        assert_eq!(cfg.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.reconnect_base, Duration::from_millis(200));
        clear_provider_env();
    }

    #[test]
    fn provider_config_fails_fast_on_missing_ws_url() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_provider_env();
        std::env::set_var("FINNHUB_TOKEN", "tok");
        std::env::set_var("FINNHUB_BASE_URL", "https://example.test");
        std::env::set_var("FINNHUB_SYMBOLS", "aapl");
        assert_eq!(
            ProviderConfig::from_env().unwrap_err(),
            ConfigError::Missing("FINNHUB_WS_URL")
        );
        clear_provider_env();
    }

    #[test]
    fn broker_config_rejects_empty_broker_list() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("KAFKA_BROKERS", " , ,");
        std::env::set_var("KAFKA_TICKS_TOPIC", "ticks");
        assert_eq!(
            BrokerConfig::from_env().unwrap_err(),
            ConfigError::Invalid {
                name: "KAFKA_BROKERS",
                reason: "must contain at least one broker address".into(),
            }
        );
        std::env::remove_var("KAFKA_BROKERS");
        std::env::remove_var("KAFKA_TICKS_TOPIC");
    }

    #[test]
    fn processor_config_defaults_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("TICKS_NUM_WORKERS");
        std::env::remove_var("TICKS_QUEUE_CAPACITY");
        let cfg = ProcessorConfig::from_env().unwrap();
        assert_eq!(cfg.num_workers, 4);
        assert_eq!(cfg.queue_capacity, 256);
    }
}
