//! EcoSort serving binary.
//!
//! Hosts the classification API, the pending upload store, and the
//! background retraining pipeline behind a single HTTP surface.

mod lifecycle;
mod orchestrator;
mod routes;
mod state;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use clap::Parser;
use ecosort_core::DataPaths;
use state::{AppState, ServerConfig, SharedState};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ecosort-server", about = "Waste classification service")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "ECOSORT_HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080, env = "ECOSORT_PORT")]
    port: u16,

    /// Root of the dataset workspace (uploads plus curated splits)
    #[arg(long, default_value = "data", env = "ECOSORT_DATA_DIR")]
    data_dir: PathBuf,

    /// Directory holding model artifacts and training metrics
    #[arg(long, default_value = "models", env = "ECOSORT_MODELS_DIR")]
    models_dir: PathBuf,

    /// Bulk raw source directory, repeatable
    #[arg(long = "source-dir")]
    source_dirs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().compact().init();

    let cli = Cli::parse();
    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        paths: DataPaths::new(cli.data_dir, cli.models_dir),
        source_dirs: cli.source_dirs,
        ..ServerConfig::default()
    };

    let state: SharedState = Arc::new(AppState::new(config));

    match state
        .lifecycle
        .load_initial(&state.config.paths.model_path)
        .await
    {
        Ok(true) => info!("Serving with model generation {}", state.lifecycle.generation()),
        Ok(false) => info!("Starting without a model; trigger /retrain to produce one"),
        Err(e) => warn!("Existing artifact is unusable, starting unloaded: {}", e),
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/predict", post(routes::predict::predict))
        .route("/upload", post(routes::upload::upload))
        .route("/retrain", post(routes::retrain::retrain))
        .route("/retrain/status", get(routes::retrain::retrain_status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("EcoSort server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;
    Ok(())
}
