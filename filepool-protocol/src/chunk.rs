//! Chunked base64 payload encoding.
//!
//! Binary payloads travel inside text frames as whitespace-separated base64
//! tokens. The input is split into consecutive slices of at most
//! `chunk_bytes` bytes and each slice is base64-encoded independently, so
//! peak encode/decode buffer size stays bounded by the chunk size and the
//! output alphabet never contains the frame delimiter's bytes.

use crate::error::ProtocolError;
use base64::prelude::BASE64_STANDARD;
use base64::Engine;

/// Encodes a payload as an ordered sequence of base64 tokens.
///
/// Empty input encodes to zero tokens. A zero `chunk_bytes` is an error.
pub fn encode(data: &[u8], chunk_bytes: usize) -> Result<Vec<String>, ProtocolError> {
    if chunk_bytes == 0 {
        return Err(ProtocolError::InvalidChunkSize);
    }

    Ok(data
        .chunks(chunk_bytes)
        .map(|slice| BASE64_STANDARD.encode(slice))
        .collect())
}

/// Decodes an ordered sequence of base64 tokens back into bytes.
///
/// Exact inverse of [`encode`]: tokens are decoded independently and
/// concatenated in order. Zero tokens decode to empty bytes.
pub fn decode<'a, I>(tokens: I) -> Result<Vec<u8>, ProtocolError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for token in tokens {
        out.extend(BASE64_STANDARD.decode(token)?);
    }
    Ok(out)
}

/// Joins tokens with single spaces for transport inside a frame.
pub fn join(tokens: &[String]) -> String {
    tokens.join(" ")
}

/// Splits a transported payload back into tokens.
pub fn split(payload: &str) -> impl Iterator<Item = &str> {
    payload.split_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_payload_encodes_to_zero_tokens() {
        assert!(encode(b"", 16).unwrap().is_empty());
    }

    #[test]
    fn test_zero_tokens_decode_to_empty_bytes() {
        assert_eq!(decode(std::iter::empty()).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(
            encode(b"data", 0),
            Err(ProtocolError::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_chunk_count_and_boundaries() {
        let data = vec![0xABu8; 10];
        let tokens = encode(&data, 4).unwrap();
        // 10 bytes at 4 bytes per chunk: 4 + 4 + 2
        assert_eq!(tokens.len(), 3);
        assert_eq!(BASE64_STANDARD.decode(&tokens[2]).unwrap().len(), 2);
    }

    #[test]
    fn test_join_split_roundtrip() {
        let tokens = encode(b"hello world, this is binary-ish \x00\x01\x02", 7).unwrap();
        let joined = join(&tokens);
        assert!(!joined.contains('\r'));
        assert!(!joined.contains('\n'));
        let decoded = decode(split(&joined)).unwrap();
        assert_eq!(decoded, b"hello world, this is binary-ish \x00\x01\x02");
    }

    #[test]
    fn test_invalid_token_rejected() {
        assert!(matches!(
            decode(["not*base64!"]),
            Err(ProtocolError::Chunk(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..4096),
                          chunk_bytes in 1usize..512) {
            let tokens = encode(&data, chunk_bytes).unwrap();
            let decoded = decode(tokens.iter().map(|s| s.as_str())).unwrap();
            prop_assert_eq!(decoded, data);
        }

        #[test]
        fn prop_roundtrip_through_join(data in proptest::collection::vec(any::<u8>(), 0..2048),
                                       chunk_bytes in 1usize..128) {
            let joined = join(&encode(&data, chunk_bytes).unwrap());
            let decoded = decode(split(&joined)).unwrap();
            prop_assert_eq!(decoded, data);
        }
    }
}
