//! Entry point for the ticks-processor service: Consumer -> Router -> Worker pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use ticks_broker::Consumer;
use ticks_config::{BrokerConfig, ConsumerConfig, ProcessorConfig};
use ticks_obs::{init_tracing, serve_http, Readiness};
use ticks_router::{NoopProcessor, Router};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Address to bind the health/readiness/metrics HTTP surface on
    #[arg(long, default_value = "0.0.0.0:2113")]
    http_addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let _guard = init_tracing("ticks-processor", &args.log_level);

    info!("starting ticks-processor v{}", env!("CARGO_PKG_VERSION"));

    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
    let metrics_handle = recorder.handle();
    metrics::set_boxed_recorder(Box::new(recorder)).expect("failed to install metrics recorder");

    let broker_cfg = BrokerConfig::from_env()?;
    let consumer_cfg = ConsumerConfig::from_env()?;
    let processor_cfg = ProcessorConfig::from_env()?;

    let readiness = Readiness::new();
    let http_addr: SocketAddr = args.http_addr.parse()?;
    let http_readiness = readiness.clone();
    tokio::spawn(async move {
        if let Err(err) = serve_http(http_addr, http_readiness, metrics_handle).await {
            error!(%err, "health/metrics server exited");
        }
    });

    let consumer = Consumer::connect(&broker_cfg, &consumer_cfg)?;
    readiness.set_ready(true);
    info!("consumer connected, marking ready");

    let cancel = CancellationToken::new();
    let (tick_tx, tick_rx) = tokio::sync::mpsc::channel(processor_cfg.queue_capacity.max(1));

    let consumer_cancel = cancel.clone();
    let consumer_handle = tokio::spawn(async move {
        consumer.run(consumer_cancel, tick_tx).await;
    });

    let shards = Router::start(
        cancel.clone(),
        tick_rx,
        processor_cfg.num_workers,
        processor_cfg.queue_capacity,
        |dropped| {
            tracing::warn!(symbol = %dropped.tick.symbol, "router dropped message, shard queue full");
        },
    );
    let worker_handles = ticks_router::start_workers(cancel.clone(), shards, Arc::new(NoopProcessor));

    signal::ctrl_c().await?;
    info!("shutdown signal received");
    cancel.cancel();

    let _ = consumer_handle.await;
    for handle in worker_handles {
        let _ = handle.await;
    }

    info!("ticks-processor shut down gracefully");
    Ok(())
}
