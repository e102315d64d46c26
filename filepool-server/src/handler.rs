//! Command dispatch.
//!
//! One handler is shared by every worker. Each decoded frame is parsed into a
//! [`Command`] and executed against the file store; any parse or storage
//! failure becomes an ERROR envelope on the same connection rather than a
//! disconnect.

use filepool_protocol::{chunk, Command, Envelope};
use filepool_storage::FileStore;
use tracing::debug;

use crate::error::ServerError;

/// Executes protocol commands against a file store.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: FileStore,
    chunk_bytes: usize,
}

impl CommandHandler {
    pub fn new(store: FileStore, chunk_bytes: usize) -> Self {
        Self { store, chunk_bytes }
    }

    /// Processes one frame and produces the response envelope.
    ///
    /// This never fails: every error is folded into an ERROR envelope so the
    /// connection survives bad requests.
    pub fn process(&self, frame: &str) -> Envelope {
        let command = match Command::parse(frame) {
            Ok(command) => command,
            Err(e) => return Envelope::error(e.to_string()),
        };

        let verb = command.verb();
        match self.execute(command) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(verb, error = %e, "command failed");
                Envelope::error(e.to_string())
            }
        }
    }

    fn execute(&self, command: Command) -> Result<Envelope, ServerError> {
        match command {
            Command::List => self.list(),
            Command::Get { name } => self.get(&name),
            Command::Upload { name, chunks } => self.upload(&name, &chunks),
            Command::Delete { name } => self.delete(&name),
        }
    }

    fn list(&self) -> Result<Envelope, ServerError> {
        let names = self.store.list()?;
        Ok(Envelope::ok(names.join("\n")))
    }

    fn get(&self, name: &str) -> Result<Envelope, ServerError> {
        let data = self.store.read(name)?;
        let chunks = chunk::encode(&data, self.chunk_bytes)?;
        Ok(Envelope::ok_file(chunk::join(&chunks)))
    }

    fn upload(&self, name: &str, chunks: &[String]) -> Result<Envelope, ServerError> {
        let data = chunk::decode(chunks.iter().map(String::as_str))?;
        self.store.write(name, &data)?;
        Ok(Envelope::ok(format!("{} stored", name)))
    }

    fn delete(&self, name: &str) -> Result<Envelope, ServerError> {
        self.store.remove(name)?;
        Ok(Envelope::ok(format!("{} deleted", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::*;
    use filepool_protocol::Status;
    use tempfile::TempDir;

    fn handler(dir: &TempDir) -> CommandHandler {
        let store = FileStore::open(dir.path()).unwrap();
        CommandHandler::new(store, 64 * 1024)
    }

    #[test]
    fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();
        let response = handler(&dir).process("LIST");
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.data.as_deref(), Some(""));
    }

    #[test]
    fn test_upload_then_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let payload = b"hello, pooled world";
        let encoded = BASE64_STANDARD.encode(payload);

        let response = handler.process(&format!("UPLOAD greeting.txt {}", encoded));
        assert_eq!(response.status, Status::Ok);
        assert_eq!(response.data.as_deref(), Some("greeting.txt stored"));

        let response = handler.process("GET greeting.txt");
        assert_eq!(response.status, Status::Ok);
        let joined = response.data_file.unwrap();
        let decoded = chunk::decode(chunk::split(&joined)).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_upload_multi_chunk() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let c1 = BASE64_STANDARD.encode(b"part one ");
        let c2 = BASE64_STANDARD.encode(b"part two");

        let response = handler.process(&format!("UPLOAD parts.bin {} {}", c1, c2));
        assert_eq!(response.status, Status::Ok);
        assert_eq!(
            std::fs::read(dir.path().join("parts.bin")).unwrap(),
            b"part one part two"
        );
    }

    #[test]
    fn test_get_missing_file() {
        let dir = TempDir::new().unwrap();
        let response = handler(&dir).process("GET ghost.txt");
        assert_eq!(response.status, Status::Error);
        assert!(response.data.unwrap().contains("ghost.txt"));
    }

    #[test]
    fn test_upload_invalid_name_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let encoded = BASE64_STANDARD.encode(b"sneaky");

        let response = handler.process(&format!("UPLOAD ../escape {}", encoded));
        assert_eq!(response.status, Status::Error);
        assert_eq!(handler.process("LIST").data.as_deref(), Some(""));
    }

    #[test]
    fn test_unknown_command() {
        let dir = TempDir::new().unwrap();
        let response = handler(&dir).process("RENAME a b");
        assert_eq!(response.status, Status::Error);
        assert!(response.data.unwrap().contains("RENAME"));
    }

    #[test]
    fn test_bad_base64_is_an_error_envelope() {
        let dir = TempDir::new().unwrap();
        let response = handler(&dir).process("UPLOAD f.bin not!base64!");
        assert_eq!(response.status, Status::Error);
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        std::fs::write(dir.path().join("old.txt"), b"x").unwrap();

        let response = handler.process("DELETE old.txt");
        assert_eq!(response.status, Status::Ok);
        assert!(!dir.path().join("old.txt").exists());

        let response = handler.process("DELETE old.txt");
        assert_eq!(response.status, Status::Error);
    }

    #[test]
    fn test_list_is_sorted() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        std::fs::write(dir.path().join("b.txt"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();

        let response = handler.process("LIST");
        assert_eq!(response.data.as_deref(), Some("a.txt\nb.txt"));
    }
}
