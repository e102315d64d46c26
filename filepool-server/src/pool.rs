//! Process-mode worker pool.
//!
//! In process mode the pool is a flat set of worker processes. The supervisor
//! re-executes its own binary once per pool slot, handing each child the full
//! configuration through an environment variable. Every child binds its own
//! SO_REUSEPORT listener on the shared address and serves connections one at
//! a time, so the pool size is exactly the number of connections in flight.

use std::net::SocketAddr;
use std::process::{Child, Command};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::ServerError;
use crate::handler::CommandHandler;
use crate::worker::{self, WorkerOptions};

/// Environment variable carrying the serialized config into worker processes.
pub const WORKER_ENV: &str = "FILEPOOL_WORKER_CONFIG";

/// Binds a TCP listener with an explicit backlog, optionally with
/// SO_REUSEPORT so sibling worker processes can share the address.
pub fn bind_listener(
    addr: SocketAddr,
    backlog: i32,
    reuse_port: bool,
) -> std::io::Result<std::net::TcpListener> {
    let domain = Domain::for_address(addr);
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    if reuse_port {
        socket.set_reuse_port(true)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    Ok(socket.into())
}

/// Reads the worker configuration from the environment, if this process was
/// launched as a pool worker.
pub fn worker_config_from_env() -> Result<Option<Config>, ServerError> {
    match std::env::var(WORKER_ENV) {
        Ok(yaml) => {
            let config = serde_yaml::from_str(&yaml)
                .map_err(|e| ServerError::WorkerConfig(e.to_string()))?;
            Ok(Some(config))
        }
        Err(_) => Ok(None),
    }
}

/// Runs the supervisor: spawns the worker processes, waits for a shutdown
/// signal, then terminates and reaps them.
pub fn run_supervisor(config: &Config) -> Result<(), ServerError> {
    let yaml =
        serde_yaml::to_string(config).map_err(|e| ServerError::WorkerConfig(e.to_string()))?;
    let exe = std::env::current_exe()?;

    let mut children: Vec<Child> = Vec::with_capacity(config.pool.size);
    for slot in 0..config.pool.size {
        let child = Command::new(&exe).env(WORKER_ENV, &yaml).spawn()?;
        debug!(slot, pid = child.id(), "worker spawned");
        children.push(child);
    }
    info!(
        addr = %config.network.bind_addr,
        pool_size = config.pool.size,
        "supervisor running"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    return;
                }
            };
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(error = %e, "failed to listen for shutdown signal");
                }
            }
            _ = sigterm.recv() => {}
        }
    });

    info!("shutting down worker pool");
    for child in &children {
        // SIGTERM lets a worker finish its current connection first.
        unsafe {
            libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
        }
    }
    for mut child in children {
        match child.wait() {
            Ok(status) => debug!(pid = child.id(), %status, "worker exited"),
            Err(e) => warn!(pid = child.id(), error = %e, "failed to reap worker"),
        }
    }
    Ok(())
}

/// Runs one pool worker: binds a shared-port listener and serves connections
/// strictly one at a time until told to terminate.
pub fn run_worker(config: Config) -> Result<(), ServerError> {
    let store = filepool_storage::FileStore::open(&config.storage.root)?;
    let handler = CommandHandler::new(store, config.storage.chunk_bytes());
    let opts = WorkerOptions {
        max_frame_bytes: config.network.max_frame_bytes(),
        read_timeout: config.network.read_timeout(),
    };

    let std_listener = bind_listener(
        config.network.bind_addr,
        config.network.listen_backlog,
        true,
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::from_std(std_listener)?;
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        info!(addr = %config.network.bind_addr, "worker listening");

        loop {
            let (mut stream, addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
                _ = sigterm.recv() => break,
                _ = tokio::signal::ctrl_c() => break,
            };

            debug!(%addr, "client connected");
            match worker::serve_connection(&mut stream, addr, &handler, &opts).await {
                Ok(frames) => debug!(%addr, frames, "client disconnected"),
                Err(e) => error!(%addr, error = %e, "connection failed"),
            }
        }

        info!("worker stopped");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_listener_ephemeral() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = bind_listener(addr, 16, false).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_reuseport_allows_two_listeners() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let first = bind_listener(addr, 16, true).unwrap();
        let shared = first.local_addr().unwrap();
        let second = bind_listener(shared, 16, true).unwrap();
        assert_eq!(second.local_addr().unwrap(), shared);
    }

    #[test]
    fn test_worker_config_env_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.network.bind_addr, config.network.bind_addr);
        assert_eq!(parsed.pool.size, config.pool.size);
    }
}
