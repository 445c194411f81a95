//! Entry point for the ticks-ingestor service: Provider -> Publisher -> Broker.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use ticks_broker::Publisher;
use ticks_config::{BrokerConfig, ProviderConfig};
use ticks_obs::{init_tracing, serve_http, Readiness};
use ticks_provider::{FinnhubProvider, Provider};

/// Budget allowed for in-flight publishes to drain once shutdown begins
/// before the ingestor forces exit.
const SHUTDOWN_DRAIN_BUDGET: Duration = Duration::from_secs(15);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Address to bind the health/readiness/metrics HTTP surface on
    #[arg(long, default_value = "0.0.0.0:2112")]
    http_addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let _guard = init_tracing("ticks-ingestor", &args.log_level);

    info!("starting ticks-ingestor v{}", env!("CARGO_PKG_VERSION"));

    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let metrics_handle = recorder.handle();
    metrics::set_boxed_recorder(Box::new(recorder)).expect("failed to install metrics recorder");

    let provider_cfg = ProviderConfig::from_env()?;
    let broker_cfg = BrokerConfig::from_env()?;

    let readiness = Readiness::new();
    let http_addr: SocketAddr = args.http_addr.parse()?;
    let http_readiness = readiness.clone();
    tokio::spawn(async move {
        if let Err(err) = serve_http(http_addr, http_readiness, metrics_handle).await {
            error!(%err, "health/metrics server exited");
        }
    });

    let publisher = Publisher::connect(&broker_cfg).await?;
    readiness.set_ready(true);
    info!("broker handshake succeeded, marking ready");

    let cancel = CancellationToken::new();
    let provider = FinnhubProvider::new(provider_cfg);
    let (mut tick_rx, mut err_rx) = provider.start(cancel.clone()).await;

    let ingest_cancel = cancel.clone();
    let ingest_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                tick = tick_rx.recv() => {
                    let Some(tick) = tick else { break; };
                    if let Err(err) = publisher.publish(&tick).await {
                        error!(%err, symbol = %tick.symbol, "failed to publish tick");
                    }
                }
                err = err_rx.recv() => {
                    let Some(err) = err else { continue; };
                    metrics::counter!("ingestor_fetch_errors_total").increment(1);
                    warn!(%err, "provider reported a non-fatal error");
                }
                _ = ingest_cancel.cancelled() => break,
            }
        }
    });

    signal::ctrl_c().await?;
    info!("shutdown signal received");
    cancel.cancel();

    if tokio::time::timeout(SHUTDOWN_DRAIN_BUDGET, ingest_handle)
        .await
        .is_err()
    {
        warn!("ingest loop did not drain within budget, forcing exit");
    }

    info!("ticks-ingestor shut down gracefully");
    Ok(())
}
