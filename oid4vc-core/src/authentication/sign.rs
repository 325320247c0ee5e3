use anyhow::Result;
use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use serde_json::Value;

/// This [`Sign`] trait is used to sign JWTs. Implementations wrap a platform
/// key store or a software key; the private key stays on the provider side.
#[async_trait]
pub trait Sign: Send + Sync {
    fn algorithm(&self) -> Algorithm;
    fn key_id(&self) -> Option<String>;
    fn public_jwk(&self) -> Option<Value>;
    async fn sign(&self, message: &str) -> Result<Vec<u8>>;
}
