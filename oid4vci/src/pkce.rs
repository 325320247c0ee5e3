use std::fmt;

use getset::Getters;
use oid4vc_core::crypto;
use serde::{Deserialize, Serialize};

/// RFC 7636 verifier/challenge pair. Only the `S256` method is supported:
/// `challenge = base64url(SHA-256(verifier))`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct PkcePair {
    verifier: String,
    challenge: String,
}

impl PkcePair {
    pub const CODE_CHALLENGE_METHOD: &'static str = "S256";

    /// 32 bytes of CSPRNG output, base64url-encoded into a 43-character
    /// verifier from the unreserved alphabet.
    pub fn generate() -> Self {
        Self::from_verifier(crypto::random_token(32))
    }

    pub fn from_verifier(verifier: String) -> Self {
        let challenge = crypto::base64url_encode(crypto::sha256(verifier.as_bytes()));
        Self { verifier, challenge }
    }
}

// The verifier is a capability; keep it out of logs.
impl fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}
