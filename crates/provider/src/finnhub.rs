use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use ticks_config::ProviderConfig;
use ticks_core::Tick;

use crate::backoff::Backoff;
use crate::envelope::decode_frame;
use crate::error::ProviderError;
use crate::{Provider, ERROR_CHANNEL_CAPACITY, TICK_CHANNEL_CAPACITY};

/// Finnhub-style trade-tick provider: one WebSocket connection, subscribed
/// to a fixed set of symbols, reconnecting with doubling backoff on any
/// transport error.
pub struct FinnhubProvider {
    cfg: ProviderConfig,
}

impl FinnhubProvider {
    pub fn new(cfg: ProviderConfig) -> Self {
        Self { cfg }
    }

    fn connect_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.cfg.ws_url)?;
        url.query_pairs_mut().append_pair("token", &self.cfg.api_token);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Provider for FinnhubProvider {
    async fn start(
        &self,
        cancel: CancellationToken,
    ) -> (mpsc::Receiver<Tick>, mpsc::Receiver<ProviderError>) {
        let (tick_tx, tick_rx) = mpsc::channel(TICK_CHANNEL_CAPACITY);
        let (err_tx, err_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

        let cfg = self.cfg.clone();
        let url = self.connect_url().expect("provider ws url must be valid");

        tokio::spawn(async move {
            run_stream(url, cfg, cancel, tick_tx, err_tx).await;
        });

        (tick_rx, err_rx)
    }
}

async fn run_stream(
    url: Url,
    cfg: ProviderConfig,
    cancel: CancellationToken,
    tick_tx: mpsc::Sender<Tick>,
    err_tx: mpsc::Sender<ProviderError>,
) {
    let mut backoff = Backoff::new(cfg.reconnect_base, cfg.reconnect_max);

    loop {
        if cancel.is_cancelled() {
            info!("provider cancelled before connect");
            return;
        }

        debug!(%url, "connecting to provider websocket");
        let connected = tokio::select! {
            res = connect_async(url.clone()) => res,
            _ = cancel.cancelled() => {
                info!("provider cancelled during connect");
                return;
            }
        };

        let mut stream = match connected {
            Ok((stream, _)) => {
                info!("provider websocket connected");
                backoff.reset();
                stream
            }
            Err(err) => {
                warn!(%err, "provider websocket connect failed");
                metrics::counter!("provider_connect_errors_total").increment(1);
                sleep_or_cancel(backoff.delay(), &cancel).await;
                backoff.step();
                continue;
            }
        };

        for symbol in &cfg.symbols {
            let frame = serde_json::json!({"type": "subscribe", "symbol": symbol});
            if let Err(err) = stream.send(Message::Text(frame.to_string())).await {
                let _ = err_tx
                    .send(ProviderError::Subscribe {
                        symbol: symbol.clone(),
                        reason: err.to_string(),
                    })
                    .await;
            }
        }

        let transport_broke = read_until_broken(&mut stream, &cancel, &tick_tx, &err_tx).await;
        let _ = stream.close(None).await;

        if cancel.is_cancelled() {
            return;
        }
        if transport_broke {
            metrics::counter!("provider_transport_errors_total").increment(1);
            sleep_or_cancel(backoff.delay(), &cancel).await;
            backoff.step();
        }
    }
}

/// Reads frames until the connection breaks, the peer closes, or
/// cancellation is observed. Returns `true` if the loop exited because of a
/// transport error (as opposed to a clean close or cancellation).
async fn read_until_broken(
    stream: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    cancel: &CancellationToken,
    tick_tx: &mpsc::Sender<Tick>,
    err_tx: &mpsc::Sender<ProviderError>,
) -> bool {
    loop {
        let next = tokio::select! {
            msg = stream.next() => msg,
            _ = cancel.cancelled() => return false,
        };

        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(err)) => {
                warn!(%err, "provider websocket read error");
                return true;
            }
            None => {
                info!("provider websocket closed by peer");
                return false;
            }
        };

        match msg {
            Message::Text(text) => match decode_frame(&text) {
                Ok(ticks) => {
                    for tick in ticks {
                        metrics::counter!("provider_ticks_total").increment(1);
                        let sent = tokio::select! {
                            res = tick_tx.send(tick) => res.is_ok(),
                            _ = cancel.cancelled() => false,
                        };
                        if !sent {
                            return false;
                        }
                    }
                }
                Err(err) => {
                    let _ = err_tx.try_send(err);
                }
            },
            Message::Ping(payload) => {
                if stream.send(Message::Pong(payload)).await.is_err() {
                    return true;
                }
            }
            Message::Close(_) => {
                info!("provider sent close frame");
                return false;
            }
            _ => {}
        }
    }
}

async fn sleep_or_cancel(delay: std::time::Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_cfg() -> ProviderConfig {
        ProviderConfig {
            api_token: "tok".into(),
            base_url: "https://example.test".into(),
            ws_url: "wss://example.test/ws".into(),
            symbols: vec!["AAPL".into(), "MSFT".into()],
            reconnect_base: Duration::from_millis(200),
            reconnect_max: Duration::from_secs(5),
        }
    }

    #[test]
    fn connect_url_carries_token_as_query_param() {
        let provider = FinnhubProvider::new(base_cfg());
        let url = provider.connect_url().unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "token" && v == "tok"));
    }
}
