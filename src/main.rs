//! filepool - pooled TCP file server
//!
//! A delimiter-framed TCP file-transfer server backed by a fixed-size worker
//! pool, in either thread (in-process tasks) or process (SO_REUSEPORT
//! siblings) mode.

use clap::Parser;
use filepool_server::{pool, Config, ExecutionMode, Server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "filepool", version, about = "Pooled TCP file server")]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, env = "FILEPOOL_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Number of pool workers
    #[arg(long)]
    pool_size: Option<usize>,

    /// Worker execution mode (thread or process)
    #[arg(long)]
    mode: Option<ExecutionMode>,

    /// Storage root directory
    #[arg(long)]
    data: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // A pool worker process gets its whole configuration from the supervisor.
    if let Some(config) = pool::worker_config_from_env()? {
        return Ok(pool::run_worker(config)?);
    }

    let cli = Cli::parse();

    // Load configuration (config file, then env overrides, then CLI flags)
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides();
            tracing::info!("Loaded config from {}", path.display());
            config
        }
        None => Config::load()?,
    };
    if let Some(bind) = cli.bind {
        config.network.bind_addr = bind;
    }
    if let Some(size) = cli.pool_size {
        config.pool.size = size;
    }
    if let Some(mode) = cli.mode {
        config.pool.mode = mode;
    }
    if let Some(data) = cli.data {
        config.storage.root = data;
    }
    config.validate()?;

    tracing::info!("Starting filepool server");
    tracing::info!("  Bind address: {}", config.network.bind_addr);
    tracing::info!("  Storage root: {}", config.storage.root.display());
    tracing::info!(
        "  Worker pool: {} ({} mode)",
        config.pool.size,
        config.pool.mode
    );

    match config.pool.mode {
        ExecutionMode::Thread => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async {
                let server = Arc::new(Server::new(config)?);

                // Spawn shutdown signal handler
                let shutdown_server = server.clone();
                tokio::spawn(async move {
                    tokio::signal::ctrl_c().await.ok();
                    tracing::info!("Received shutdown signal, stopping server...");
                    shutdown_server.shutdown();
                });

                // Run server (blocks until shutdown and drain)
                server.run().await?;
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
        }
        ExecutionMode::Process => {
            pool::run_supervisor(&config)?;
        }
    }

    Ok(())
}
