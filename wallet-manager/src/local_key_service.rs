use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use oid4vc_core::crypto;
use oid4vc_core::identifier::KeyId;
use oid4vc_core::{HolderKey, HolderKeyService};
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};

/// Software P-256 key service (ES256). Keys live in process memory only;
/// production embedders plug a platform-backed implementation of the same
/// trait.
#[derive(Default)]
pub struct LocalKeyService {
    keys: Mutex<HashMap<KeyId, SigningKey>>,
}

impl LocalKeyService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HolderKeyService for LocalKeyService {
    async fn generate_key(&self) -> Result<HolderKey> {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        let key_id = KeyId::new(crypto::random_token(16))?;
        let point = key.verifying_key().to_encoded_point(false);
        let public_jwk = serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": crypto::base64url_encode(point.x().ok_or(anyhow!("invalid public key point"))?),
            "y": crypto::base64url_encode(point.y().ok_or(anyhow!("invalid public key point"))?),
        });
        self.keys
            .lock()
            .map_err(|_| anyhow!("poisoned key store lock"))?
            .insert(key_id.clone(), key);
        Ok(HolderKey {
            key_id,
            algorithm: Algorithm::ES256,
            public_jwk,
        })
    }

    async fn sign(&self, key_id: &KeyId, message: &str) -> Result<Vec<u8>> {
        let keys = self.keys.lock().map_err(|_| anyhow!("poisoned key store lock"))?;
        let key = keys.get(key_id).ok_or_else(|| anyhow!("unknown key id {key_id}"))?;
        let signature: Signature = key.sign(message.as_bytes());
        Ok(signature.to_bytes().to_vec())
    }
}
