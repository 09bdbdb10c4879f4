//! firestore-changelog server entry point.
//!
//! Builds the configured warehouse sink once and serves the change
//! delivery endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use firestore_changelog::api;
use firestore_changelog::app_state::AppState;
use firestore_changelog::config::{LogFormat, ShimConfig, WarehouseBackend};
use firestore_changelog::domain::DocumentPathTemplate;
use firestore_changelog::service::ChangeEventTranslator;
use firestore_changelog::sink::{
    BigQuerySink, BigQuerySinkConfig, MemorySink, PostgresSink, WarehouseSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ShimConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        project = %config.project_id,
        collection = %config.collection,
        "starting firestore-changelog"
    );

    // Build the sink once; every invocation shares it
    let sink = build_sink(&config).await?;
    tracing::info!(sink = %sink.describe(), "warehouse sink configured");

    let translator = ChangeEventTranslator::new(
        sink,
        DocumentPathTemplate::new(&config.project_id, &config.collection),
    );
    let app = api::app(
        AppState::new(translator),
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_sink(config: &ShimConfig) -> anyhow::Result<Arc<dyn WarehouseSink>> {
    let sink: Arc<dyn WarehouseSink> = match config.backend {
        WarehouseBackend::BigQuery => Arc::new(
            BigQuerySink::connect(BigQuerySinkConfig {
                project_id: config.project_id.clone(),
                dataset_id: config.dataset_id.clone(),
                table_id: config.table_id.clone(),
                credentials_file: config.credentials_file.clone(),
                skip_invalid_rows: config.skip_invalid_rows,
                ignore_unknown_values: config.ignore_unknown_values,
            })
            .await?,
        ),
        WarehouseBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
                .connect(&config.database_url)
                .await
                .context("failed to connect to PostgreSQL")?;
            let sink = PostgresSink::new(pool, config.postgres_table.as_str())?;
            sink.ensure_table().await?;
            Arc::new(sink)
        }
        WarehouseBackend::Memory => {
            tracing::warn!("memory backend selected: rows are logged and discarded");
            Arc::new(MemorySink::dry_run())
        }
    };
    Ok(sink)
}
