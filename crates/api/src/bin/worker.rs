//! Fulfillment worker entry point.

use std::net::Ipv4Addr;

use api::Config;
use api::telemetry::{init_tracing, shutdown_signal};
use broker::{AmqpBroker, AmqpConfig, Broker};
use cache::RedisCache;
use fulfillment::{FulfillmentWorker, SimulatedPaymentGateway};
use metrics_exporter_prometheus::PrometheusBuilder;
use order_store::PostgresOrderStore;
use search::{ElasticsearchIndex, SearchIndex};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    init_tracing(&config);

    // The worker has no router, so the exporter serves /metrics itself.
    PrometheusBuilder::new()
        .with_http_listener((Ipv4Addr::UNSPECIFIED, config.metrics_port))
        .install()
        .expect("failed to install Prometheus exporter");

    let store = PostgresOrderStore::connect(&config.database_url)
        .await
        .expect("failed to connect to PostgreSQL");
    if config.run_migrations {
        store
            .run_migrations()
            .await
            .expect("failed to run migrations");
    }

    let broker = AmqpBroker::connect(AmqpConfig::new(&config.rabbit_url))
        .await
        .expect("failed to connect to RabbitMQ");
    let cache = RedisCache::connect(&config.redis_url)
        .await
        .expect("failed to connect to Redis");
    let index =
        ElasticsearchIndex::new(config.elasticsearch()).expect("failed to build search client");
    if let Err(e) = index.ensure_index().await {
        tracing::warn!(error = %e, "search index unavailable, will retry on first write");
    }

    let worker = FulfillmentWorker::new(
        store,
        index,
        SimulatedPaymentGateway::new(config.payment_delay),
        cache,
    )
    .with_cache_policy(config.cache_policy());

    let deliveries = broker
        .consume()
        .await
        .expect("failed to start consuming");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    tracing::info!(policy = ?config.cache_policy(), "starting fulfillment worker");
    if let Err(e) = worker.run(deliveries, shutdown).await {
        tracing::error!(error = %e, "fulfillment worker stopped unexpectedly");
    }

    if let Err(e) = broker.close().await {
        tracing::warn!(error = %e, "broker connection did not close cleanly");
    }
    tracing::info!("worker shut down gracefully");
}
