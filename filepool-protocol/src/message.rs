//! Command and response envelope types.
//!
//! A command frame is the verb and its space-separated arguments
//! (`UPLOAD name chunk1 chunk2 ...`). A response frame is the JSON
//! envelope `{"status": ..., "data": ..., "data_file": ...}`; binary
//! payloads are delivered only through the chunk-encoded `data_file`
//! field, never as raw bytes.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enumerate stored file names.
    List,
    /// Download a stored file.
    Get { name: String },
    /// Store a file from one or more base64 chunks.
    Upload { name: String, chunks: Vec<String> },
    /// Remove a stored file.
    Delete { name: String },
}

impl Command {
    /// Parses a decoded command frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let mut tokens = frame.split_whitespace();
        let verb = tokens.next().ok_or(ProtocolError::EmptyFrame)?;
        let args: Vec<&str> = tokens.collect();

        match verb {
            "LIST" => {
                if !args.is_empty() {
                    return Err(ProtocolError::BadArity {
                        verb: "LIST",
                        usage: "LIST",
                    });
                }
                Ok(Command::List)
            }
            "GET" => match args.as_slice() {
                [name] => Ok(Command::Get {
                    name: name.to_string(),
                }),
                _ => Err(ProtocolError::BadArity {
                    verb: "GET",
                    usage: "GET <name>",
                }),
            },
            "UPLOAD" => match args.as_slice() {
                [name, chunks @ ..] if !chunks.is_empty() => Ok(Command::Upload {
                    name: name.to_string(),
                    chunks: chunks.iter().map(|c| c.to_string()).collect(),
                }),
                _ => Err(ProtocolError::BadArity {
                    verb: "UPLOAD",
                    usage: "UPLOAD <name> <chunk>...",
                }),
            },
            "DELETE" => match args.as_slice() {
                [name] => Ok(Command::Delete {
                    name: name.to_string(),
                }),
                _ => Err(ProtocolError::BadArity {
                    verb: "DELETE",
                    usage: "DELETE <name>",
                }),
            },
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }

    /// Returns the verb for logging.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::List => "LIST",
            Command::Get { .. } => "GET",
            Command::Upload { .. } => "UPLOAD",
            Command::Delete { .. } => "DELETE",
        }
    }

    /// Encodes the command as frame content (client side).
    pub fn encode(&self) -> String {
        match self {
            Command::List => "LIST".to_string(),
            Command::Get { name } => format!("GET {}", name),
            Command::Upload { name, chunks } => {
                format!("UPLOAD {} {}", name, chunks.join(" "))
            }
            Command::Delete { name } => format!("DELETE {}", name),
        }
    }
}

/// Response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// Response envelope returned for every command.
///
/// Exactly one of `data`/`data_file` is meaningful for a given status and
/// verb: `data` carries listings, confirmations and error messages;
/// `data_file` carries a chunk-encoded download payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
}

impl Envelope {
    /// Success envelope with a text payload.
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            data: Some(data.into()),
            data_file: None,
        }
    }

    /// Success envelope with a chunk-encoded file payload.
    pub fn ok_file(encoded: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            data: None,
            data_file: Some(encoded.into()),
        }
    }

    /// Error envelope with a descriptive message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: Some(message.into()),
            data_file: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Serializes the envelope for framing.
    pub fn to_json(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes an envelope from decoded frame content.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(Command::parse("LIST").unwrap(), Command::List);
    }

    #[test]
    fn test_parse_get() {
        assert_eq!(
            Command::parse("GET report.pdf").unwrap(),
            Command::Get {
                name: "report.pdf".to_string()
            }
        );
    }

    #[test]
    fn test_parse_upload_multi_chunk() {
        let cmd = Command::parse("UPLOAD f.bin aGVsbG8= d29ybGQ=").unwrap();
        assert_eq!(
            cmd,
            Command::Upload {
                name: "f.bin".to_string(),
                chunks: vec!["aGVsbG8=".to_string(), "d29ybGQ=".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_delete() {
        assert_eq!(
            Command::parse("DELETE f.bin").unwrap(),
            Command::Delete {
                name: "f.bin".to_string()
            }
        );
    }

    #[test]
    fn test_parse_arity_errors() {
        assert!(matches!(
            Command::parse("LIST extra"),
            Err(ProtocolError::BadArity { verb: "LIST", .. })
        ));
        assert!(matches!(
            Command::parse("GET"),
            Err(ProtocolError::BadArity { verb: "GET", .. })
        ));
        assert!(matches!(
            Command::parse("GET a b"),
            Err(ProtocolError::BadArity { verb: "GET", .. })
        ));
        assert!(matches!(
            Command::parse("UPLOAD name-only"),
            Err(ProtocolError::BadArity { verb: "UPLOAD", .. })
        ));
    }

    #[test]
    fn test_parse_unknown_verb() {
        assert!(matches!(
            Command::parse("FETCH x"),
            Err(ProtocolError::UnknownCommand(_))
        ));
        // Verbs are case-sensitive on the wire.
        assert!(matches!(
            Command::parse("list"),
            Err(ProtocolError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_empty_frame() {
        assert!(matches!(Command::parse(""), Err(ProtocolError::EmptyFrame)));
        assert!(matches!(
            Command::parse("   "),
            Err(ProtocolError::EmptyFrame)
        ));
    }

    #[test]
    fn test_command_encode_roundtrip() {
        for cmd in [
            Command::List,
            Command::Get {
                name: "a.txt".to_string(),
            },
            Command::Upload {
                name: "a.bin".to_string(),
                chunks: vec!["QUJD".to_string(), "REVG".to_string()],
            },
            Command::Delete {
                name: "a.txt".to_string(),
            },
        ] {
            assert_eq!(Command::parse(&cmd.encode()).unwrap(), cmd);
        }
    }

    #[test]
    fn test_envelope_wire_format() {
        let json = String::from_utf8(Envelope::ok("f.bin").to_json().unwrap()).unwrap();
        assert!(json.contains(r#""status":"OK""#));
        assert!(!json.contains("data_file"));

        let json =
            String::from_utf8(Envelope::error("file not found").to_json().unwrap()).unwrap();
        assert!(json.contains(r#""status":"ERROR""#));
        assert!(json.contains("file not found"));

        let json = String::from_utf8(Envelope::ok_file("QUJD REVG").to_json().unwrap()).unwrap();
        assert!(json.contains(r#""data_file":"QUJD REVG""#));
    }

    #[test]
    fn test_envelope_json_roundtrip() {
        let envelope = Envelope::ok_file("QUJD");
        let parsed = Envelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
        assert!(parsed.is_ok());
    }
}
