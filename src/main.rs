use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use utts_backend::{routes, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("utts_backend=debug,tower_http=debug")),
        )
        .init();

    // Load configuration - first existing candidate wins, env overrides on top
    let config_paths: Vec<PathBuf> = vec![
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from),
        Some(PathBuf::from("conf.yaml")),
        Some(PathBuf::from("conf.json")),
        Some(PathBuf::from("config/conf.yaml")),
    ]
    .into_iter()
    .flatten()
    .collect();

    let config_path = config_paths.iter().find(|path| path.exists());
    let config = Config::load(config_path.map(PathBuf::as_path))?;

    match config_path {
        Some(path) => info!("Loaded configuration from: {:?}", path),
        None => info!("No config file found (tried {:?}); using defaults", config_paths),
    }

    // Ensure the sound file directory exists so it can be served right away
    std::fs::create_dir_all(&config.sound_files.dir)?;
    info!(
        "Sound files in {:?} (max {}), ASR model at {:?}",
        config.sound_files.dir, config.sound_files.max_files, config.asr_model.local_path
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Initialize app state
    let app_state = AppState::new(config)?;
    let app = routes::build_app(app_state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
