//! High-level client API.

use crate::connection::{Connection, ConnectionConfig};
use crate::error::ClientError;
use filepool_protocol::{chunk, Command, Envelope};
use std::sync::Arc;

/// High-level client for filepool.
pub struct Client {
    conn: Arc<Connection>,
}

impl Client {
    /// Creates a new client with the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            conn: Arc::new(Connection::new(config)),
        }
    }

    /// Connects to the server.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.conn.connect().await
    }

    /// Returns whether the client is connected.
    pub async fn is_connected(&self) -> bool {
        self.conn.is_connected().await
    }

    /// Closes the connection.
    pub async fn close(&self) {
        self.conn.close().await
    }

    async fn request(&self, command: Command) -> Result<Envelope, ClientError> {
        let envelope = self.conn.roundtrip(&command).await?;
        if !envelope.is_ok() {
            let message = envelope.data.unwrap_or_else(|| "unknown error".to_string());
            return Err(ClientError::Server(message));
        }
        Ok(envelope)
    }

    /// Lists the files stored on the server.
    pub async fn list(&self) -> Result<Vec<String>, ClientError> {
        let envelope = self.request(Command::List).await?;
        let listing = envelope
            .data
            .ok_or_else(|| ClientError::MalformedResponse("LIST reply without data".to_string()))?;
        Ok(listing.lines().map(str::to_string).collect())
    }

    /// Downloads a file and returns its decoded contents.
    pub async fn download(&self, name: impl Into<String>) -> Result<Vec<u8>, ClientError> {
        let envelope = self.request(Command::Get { name: name.into() }).await?;
        let joined = envelope.data_file.ok_or_else(|| {
            ClientError::MalformedResponse("GET reply without data_file".to_string())
        })?;
        Ok(chunk::decode(chunk::split(&joined))?)
    }

    /// Uploads a file under the given name, replacing any previous contents.
    ///
    /// The wire format requires at least one chunk per upload, so empty
    /// payloads are rejected here rather than bounced by the server.
    pub async fn upload(
        &self,
        name: impl Into<String>,
        data: &[u8],
    ) -> Result<(), ClientError> {
        if data.is_empty() {
            return Err(ClientError::EmptyPayload);
        }
        let chunks = chunk::encode(data, self.conn.config().chunk_bytes)?;
        self.request(Command::Upload {
            name: name.into(),
            chunks,
        })
        .await?;
        Ok(())
    }

    /// Deletes a file from the server.
    pub async fn delete(&self, name: impl Into<String>) -> Result<(), ClientError> {
        self.request(Command::Delete { name: name.into() }).await?;
        Ok(())
    }
}
