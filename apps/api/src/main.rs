mod config;
mod errors;
mod extract;
mod lexicon;
mod puzzle;
mod routes;
mod sessions;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::lexicon::{Lexicon, WordIndex};
use crate::routes::build_router;
use crate::sessions::sweeper::spawn_sweeper;
use crate::sessions::SessionManager;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting crossword API v{}", env!("CARGO_PKG_VERSION"));

    // Word source: LEXICON_PATH if set, otherwise the compiled-in list
    let lexicon: Arc<dyn Lexicon> = match &config.lexicon_path {
        Some(path) => Arc::new(WordIndex::from_file(path)?),
        None => {
            let index = WordIndex::builtin();
            info!("Using built-in lexicon ({} words)", index.len());
            Arc::new(index)
        }
    };
    info!(
        "Word lengths {}..={}, default seed {:?}, default count {}",
        config.min_word_length, config.max_word_length, config.default_seed, config.default_word_count
    );

    // Sessions live in memory only; idle ones are swept in the background
    let sessions = SessionManager::new();
    spawn_sweeper(
        sessions.clone(),
        Duration::from_secs(config.session_sweep_interval_secs),
        chrono::Duration::seconds(config.session_max_idle_secs as i64),
    );
    info!(
        "Session sweeper running every {}s (max idle {}s)",
        config.session_sweep_interval_secs, config.session_max_idle_secs
    );

    let state = AppState {
        lexicon,
        sessions,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // the canvas client may be served from another origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
