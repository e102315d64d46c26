//! Pooled TCP server.
//!
//! Thread mode runs here: one accept loop where a semaphore permit must be
//! held before `accept()` is called. With all permits taken, excess
//! connections queue in the kernel backlog; none are refused or dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use filepool_storage::FileStore;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::CommandHandler;
use crate::pool;
use crate::worker::{self, WorkerOptions};

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub connections_active: AtomicU64,
    pub requests_total: AtomicU64,
    pub errors_total: AtomicU64,
}

/// The pooled file server.
pub struct Server {
    config: Config,
    handler: Arc<CommandHandler>,
    stats: Arc<ServerStats>,
    shutdown: broadcast::Sender<()>,
    /// Set by `shutdown()` so a stop requested before `serve()` subscribes
    /// is not lost.
    shutdown_requested: AtomicBool,
    running: AtomicBool,
}

impl Server {
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let store = FileStore::open(&config.storage.root)?;
        let handler = Arc::new(CommandHandler::new(store, config.storage.chunk_bytes()));
        let (shutdown, _) = broadcast::channel(1);

        Ok(Self {
            config,
            handler,
            stats: Arc::new(ServerStats::default()),
            shutdown,
            shutdown_requested: AtomicBool::new(false),
            running: AtomicBool::new(false),
        })
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let std_listener = pool::bind_listener(
            self.config.network.bind_addr,
            self.config.network.listen_backlog,
            false,
        )?;
        let listener = TcpListener::from_std(std_listener)?;
        info!(
            addr = %self.config.network.bind_addr,
            pool_size = self.config.pool.size,
            "server listening"
        );
        self.serve(listener).await
    }

    /// Serves connections from an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        self.running.store(true, Ordering::SeqCst);
        let pool_size = self.config.pool.size;
        let semaphore = Arc::new(Semaphore::new(pool_size));
        let opts = WorkerOptions {
            max_frame_bytes: self.config.network.max_frame_bytes(),
            read_timeout: self.config.network.read_timeout(),
        };
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            if self.shutdown_requested.load(Ordering::SeqCst) {
                break;
            }

            // A permit is a worker slot; hold one before accepting so that
            // connections beyond the pool size wait in the kernel backlog.
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = shutdown_rx.recv() => break,
            };

            let (mut stream, addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
                _ = shutdown_rx.recv() => {
                    drop(permit);
                    break;
                }
            };

            self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
            self.stats.connections_active.fetch_add(1, Ordering::Relaxed);
            debug!(%addr, "client connected");

            let handler = Arc::clone(&self.handler);
            let stats = Arc::clone(&self.stats);
            let opts = opts.clone();

            tokio::spawn(async move {
                match worker::serve_connection(&mut stream, addr, &handler, &opts).await {
                    Ok(frames) => {
                        stats.requests_total.fetch_add(frames, Ordering::Relaxed);
                        debug!(%addr, frames, "client disconnected");
                    }
                    Err(e) => {
                        stats.errors_total.fetch_add(1, Ordering::Relaxed);
                        error!(%addr, error = %e, "connection failed");
                    }
                }
                stats.connections_active.fetch_sub(1, Ordering::Relaxed);
                drop(permit);
            });
        }

        // In-flight workers finish before run() returns.
        if let Ok(permits) = semaphore.acquire_many(pool_size as u32).await {
            permits.forget();
        }
        self.running.store(false, Ordering::SeqCst);
        info!("server stopped");
        Ok(())
    }

    /// Signals the accept loop to stop and drain.
    pub fn shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        let _ = self.shutdown.send(());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}
