mod config;
mod error;
mod handlers;
mod models;
mod notify;
mod reconciler;
mod registry;
mod router;
mod scheduler;
mod source;
mod state;
mod store;

use std::sync::Arc;

use tokio::net::TcpListener;

use config::Config;
use notify::Notifier;
use reconciler::Reconciler;
use registry::SubscriberRegistry;
use router::create_router;
use scheduler::Scheduler;
use source::HttpCatalogSource;
use state::AppState;
use store::{RecordStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    tracing::info!(
        db = %config.database_path,
        catalog = %config.catalog_url,
        interval_secs = config.sync_interval.as_secs(),
        "Starting storefeed service"
    );

    let store: Arc<dyn RecordStore> = Arc::new(SqliteStore::open(&config.database_path)?);
    let registry = Arc::new(SubscriberRegistry::new());
    let notifier = Notifier::new(Arc::clone(&registry));

    let source = Arc::new(HttpCatalogSource::new(
        config.catalog_url.clone(),
        config.page_size,
    ));
    let reconciler = Reconciler::new(source, Arc::clone(&store), notifier.clone());
    let scheduler = Scheduler::spawn(reconciler, config.sync_interval);

    let state = AppState {
        store,
        registry,
        notifier,
        scheduler: scheduler.handle(),
    };

    let app = create_router(state);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // An in-flight cycle finishes its current record's commit before the
    // scheduler loop exits; remaining records are abandoned.
    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
