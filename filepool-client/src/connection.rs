//! Connection management.
//!
//! The protocol is strictly request/response per connection, so a connection
//! holds one stream and one frame codec behind a mutex and resolves each
//! command with the next complete frame from the server.

use crate::error::ClientError;
use filepool_protocol::{encode_frame, Command, Envelope, FrameCodec, DEFAULT_CHUNK_BYTES};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

/// Default read buffer size (8 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// Minimum read buffer size (1 KiB).
pub const MIN_READ_BUFFER_SIZE: usize = 1024;

/// Maximum read buffer size (1 MiB).
pub const MAX_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Read buffer size for socket reads.
    pub read_buffer_size: usize,
    /// Chunk size used when encoding uploads.
    pub chunk_bytes: usize,
}

impl ConnectionConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes;
        self
    }
}

struct Inner {
    stream: TcpStream,
    codec: FrameCodec,
}

/// A connection to a filepool server.
pub struct Connection {
    config: ConnectionConfig,
    inner: Mutex<Option<Inner>>,
}

impl Connection {
    /// Creates a new connection (not yet connected).
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Connects to the server.
    pub async fn connect(&self) -> Result<(), ClientError> {
        tracing::debug!("Connecting to {}...", self.config.addr);

        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(self.config.addr),
        )
        .await
        .map_err(|_| ClientError::Timeout)??;

        stream.set_nodelay(true).ok();
        tracing::debug!("Connected to {}", self.config.addr);

        *self.inner.lock().await = Some(Inner {
            stream,
            codec: FrameCodec::new(),
        });
        Ok(())
    }

    /// Returns whether the connection is established.
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    /// Closes the connection.
    pub async fn close(&self) {
        if let Some(inner) = self.inner.lock().await.take() {
            drop(inner);
            tracing::debug!("Connection closed");
        }
    }

    /// Sends one command and waits for its response envelope.
    pub async fn roundtrip(&self, command: &Command) -> Result<Envelope, ClientError> {
        let mut guard = self.inner.lock().await;
        let inner = guard.as_mut().ok_or(ClientError::NotConnected)?;

        let frame = encode_frame(command.encode().as_bytes())?;
        inner.stream.write_all(&frame).await?;

        let envelope = match tokio::time::timeout(self.config.request_timeout, async {
            let mut buf = vec![0u8; self.config.read_buffer_size];
            loop {
                if let Some(frame) = inner.codec.next_frame()? {
                    return Envelope::from_json(&frame);
                }
                let n = inner.stream.read(&mut buf).await?;
                if n == 0 {
                    return Err(filepool_protocol::ProtocolError::Io(
                        std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "connection closed"),
                    ));
                }
                inner.codec.extend(&buf[..n]);
            }
        })
        .await
        {
            Ok(result) => result,
            Err(_) => {
                // The reply to the timed-out command may still arrive; a
                // reused stream would pair it with the next command.
                *guard = None;
                return Err(ClientError::Timeout);
            }
        };

        match envelope {
            Ok(envelope) => Ok(envelope),
            Err(filepool_protocol::ProtocolError::Io(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                // The server hung up mid-request; drop the stale stream.
                *guard = None;
                Err(ClientError::ConnectionClosed)
            }
            Err(e) => Err(e.into()),
        }
    }
}
