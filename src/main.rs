use anyhow::{Context, Result};
use asl_expressor::{
    create_router, AppState, CaptureBackendFactory, Config, DirectoryDownloads, MemoryClipboard,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "asl-expressor", version, about = "Dual-side camera/microphone session server")]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/asl-expressor")]
    config: String,

    /// Override the HTTP bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut cfg = Config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.service.http.bind = bind;
    }
    if let Some(port) = args.port {
        cfg.service.http.port = port;
    }

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Capture backend: {:?}", cfg.capture.source);

    let downloads_dir = PathBuf::from(shellexpand::tilde(&cfg.recorder.downloads_dir).into_owned());
    let downloads = Arc::new(DirectoryDownloads::new(&downloads_dir)?);
    info!("Recordings will be saved to {}", downloads_dir.display());

    let backend = CaptureBackendFactory::create(cfg.capture.clone());
    let state = AppState::new(&cfg, backend, downloads, Arc::new(MemoryClipboard::new()))
        .with_downloads_dir(downloads_dir);

    let app = create_router(state.clone());

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    state.shutdown().await;
    info!("Sessions torn down, {} events logged", state.log.len());

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutdown requested");
}
