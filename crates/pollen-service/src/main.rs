//! Pollen Service - Background feed sync and HTTP API.
//!
//! Run with: `cargo run -p pollen-service`

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use pollen_service::{AppState, Config, SyncStats, Syncer, api};
use pollen_store::{IndexedStore, Keyspace, MemoryBackend, RedisBackend, ReportStore};

/// Pollen Service - Background feed sync and HTTP REST API.
#[derive(Parser, Debug)]
#[command(name = "pollen-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Redis host:port (overrides config and REDIS_HOST).
    #[arg(long)]
    redis_host: Option<String>,

    /// Keep reports in process memory instead of Redis.
    #[arg(long)]
    memory: bool,

    /// Disable the background feed sync (API only mode).
    #[arg(long)]
    no_sync: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pollen_service=info".parse()?)
                .add_directive("pollen_store=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    config.apply_env();
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(host) = args.redis_host {
        config.storage.host = host;
    }
    config.validate()?;

    let keys = Keyspace::new(config.storage.key_prefix.clone());
    let store: Arc<dyn ReportStore> = if args.memory {
        info!("Using in-memory storage; reports are lost on exit");
        Arc::new(IndexedStore::with_keyspace(MemoryBackend::new(), keys))
    } else {
        let backend = RedisBackend::connect_with(
            config.storage.connection_info()?,
            config.storage.connect_timeout(),
        )
        .await?;
        Arc::new(IndexedStore::with_keyspace(backend, keys))
    };

    let sync_stats = if args.no_sync {
        info!("Background sync disabled");
        Arc::new(SyncStats::new())
    } else {
        let syncer = Syncer::new(Arc::clone(&store), config.sync.clone())?;
        let stats = syncer.stats();
        syncer.spawn();
        stats
    };

    let state = AppState::new(store, config.clone(), sync_stats);

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str()).await?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
