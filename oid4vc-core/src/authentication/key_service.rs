use anyhow::Result;
use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use serde_json::Value;

use crate::identifier::KeyId;

/// A freshly provisioned holder key as reported by the key service.
#[derive(Debug, Clone)]
pub struct HolderKey {
    pub key_id: KeyId,
    pub algorithm: Algorithm,
    pub public_jwk: Value,
}

/// Provisions holder proof-of-possession keys and signs with them. Key
/// generation policy (curve choice, hardware backing) is the provider's
/// concern; callers only see the key id and the public JWK.
#[async_trait]
pub trait HolderKeyService: Send + Sync {
    async fn generate_key(&self) -> Result<HolderKey>;
    async fn sign(&self, key_id: &KeyId, message: &str) -> Result<Vec<u8>>;
}
