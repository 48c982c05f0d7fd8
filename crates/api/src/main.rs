//! API server entry point.

use std::sync::Arc;

use api::Config;
use api::telemetry::{init_tracing, shutdown_signal};
use broker::{AmqpBroker, AmqpConfig};
use cache::RedisCache;
use metrics_exporter_prometheus::PrometheusBuilder;
use order_store::PostgresOrderStore;
use search::{ElasticsearchIndex, SearchIndex};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Connect backing services
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
    let broker = Arc::new(broker);

    let cache = RedisCache::connect(&config.redis_url)
        .await
        .expect("failed to connect to Redis");

    let index =
        ElasticsearchIndex::new(config.elasticsearch()).expect("failed to build search client");
    if let Err(e) = index.ensure_index().await {
        tracing::warn!(error = %e, "search index unavailable, will retry on first use");
    }

    // 4. Build the application
    let state = api::create_state(store, Arc::clone(&broker), cache, index, config.cache_ttl);
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    if let Err(e) = broker.close().await {
        tracing::warn!(error = %e, "broker connection did not close cleanly");
    }
    tracing::info!("server shut down gracefully");
}
