//! Per-connection worker loop.
//!
//! A worker owns one accepted connection for its whole lifetime: it reads
//! bytes into the frame codec, dispatches each complete frame through the
//! shared handler, and writes back one framed JSON envelope per request.

use std::net::SocketAddr;
use std::time::Duration;

use filepool_protocol::{encode_frame, Envelope, FrameCodec, ProtocolError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::ServerError;
use crate::handler::CommandHandler;

const READ_BUFFER_SIZE: usize = 8192;

/// Per-connection options derived from the network configuration.
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    /// Cap on a buffered partial frame; breaching it closes the connection.
    pub max_frame_bytes: Option<usize>,
    /// Idle read timeout; expiring closes the connection quietly.
    pub read_timeout: Option<Duration>,
}

/// Serves one connection until the peer disconnects, the read timeout
/// expires, or a transport-level failure occurs.
///
/// Returns the number of frames processed. Malformed commands do not end the
/// connection; only I/O errors and a breached frame cap do.
pub async fn serve_connection(
    stream: &mut TcpStream,
    addr: SocketAddr,
    handler: &CommandHandler,
    opts: &WorkerOptions,
) -> Result<u64, ServerError> {
    let mut codec = FrameCodec::new().with_max_frame_bytes(opts.max_frame_bytes);
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut frames = 0u64;

    loop {
        let n = match opts.read_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, stream.read(&mut buf)).await {
                Ok(result) => result?,
                Err(_) => {
                    debug!(%addr, "read timeout expired, closing connection");
                    return Ok(frames);
                }
            },
            None => stream.read(&mut buf).await?,
        };

        if n == 0 {
            return Ok(frames);
        }
        codec.extend(&buf[..n]);

        while let Some(frame) = codec.next_frame()? {
            trace!(%addr, len = frame.len(), "frame received");
            let envelope = match std::str::from_utf8(&frame) {
                Ok(text) => handler.process(text),
                Err(_) => Envelope::error(ProtocolError::InvalidUtf8.to_string()),
            };
            frames += 1;

            let response = encode_frame(&envelope.to_json()?)?;
            stream.write_all(&response).await?;
        }
    }
}
