use rand::RngCore;
use sha2::{Digest, Sha256};

/// SHA-256 digest of the input.
pub fn sha256(input: &[u8]) -> Vec<u8> {
    Sha256::digest(input).to_vec()
}

/// `n` bytes from the process CSPRNG.
pub fn random_bytes(n: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// `n` CSPRNG bytes, base64url-encoded without padding.
pub fn random_token(n: usize) -> String {
    base64url_encode(random_bytes(n))
}

pub fn base64url_encode(input: impl AsRef<[u8]>) -> String {
    base64_url::encode(input.as_ref())
}

pub fn base64url_decode(input: &str) -> Result<Vec<u8>, InvalidBase64> {
    base64_url::decode(input).map_err(|e| InvalidBase64(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
#[error("invalid base64url: {0}")]
pub struct InvalidBase64(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_token_length() {
        // 16 bytes must come out as 22 unpadded base64url characters.
        let token = random_token(16);
        assert_eq!(token.len(), 22);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_base64url_round_trip() {
        let bytes = random_bytes(32);
        assert_eq!(base64url_decode(&base64url_encode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            base64url_encode(sha256(b"hello")),
            "LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ"
        );
    }
}
