use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, Header};
use oid4vc_core::{builder_fn, jwt, HolderKey, HolderKeyService, RFC7519Claims, Sign};
use serde::{Deserialize, Serialize};

/// Key proof attached to a credential request, as described here:
/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-proof-types
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(tag = "proof_type", rename_all = "lowercase")]
pub enum Proof {
    Jwt { jwt: String },
}

impl Proof {
    pub fn builder() -> ProofBuilder {
        ProofBuilder::default()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProofOfPossession {
    #[serde(flatten)]
    pub rfc7519_claims: RFC7519Claims,
    pub nonce: String,
}

#[derive(Default)]
pub struct ProofBuilder {
    rfc7519_claims: RFC7519Claims,
    nonce: Option<String>,
    key_service: Option<Arc<dyn HolderKeyService>>,
    key: Option<HolderKey>,
}

impl ProofBuilder {
    pub async fn build(self) -> Result<Proof> {
        anyhow::ensure!(self.rfc7519_claims.aud.is_some(), "aud claim is required");
        anyhow::ensure!(self.rfc7519_claims.iat.is_some(), "iat claim is required");
        let nonce = self.nonce.ok_or(anyhow!("nonce claim is required"))?;
        let key = self.key.ok_or(anyhow!("no holder key found"))?;
        let key_service = self.key_service.ok_or(anyhow!("no key service found"))?;

        let header = Header {
            typ: Some("openid4vci-proof+jwt".to_string()),
            alg: key.algorithm,
            jwk: Some(serde_json::from_value(key.public_jwk.clone())?),
            ..Default::default()
        };

        let signer = HolderKeySigner { key_service, key };
        let jwt = jwt::encode(
            &signer,
            header,
            ProofOfPossession {
                rfc7519_claims: self.rfc7519_claims,
                nonce,
            },
        )
        .await?;

        Ok(Proof::Jwt { jwt })
    }

    pub fn key_service(mut self, key_service: Arc<dyn HolderKeyService>) -> Self {
        self.key_service = Some(key_service);
        self
    }

    pub fn key(mut self, key: HolderKey) -> Self {
        self.key = Some(key);
        self
    }

    builder_fn!(rfc7519_claims, iss, String);
    builder_fn!(rfc7519_claims, aud, String);
    builder_fn!(rfc7519_claims, iat, i64);
    builder_fn!(nonce, String);
}

/// Adapts a holder key provisioned by the key service to the [`Sign`] seam.
struct HolderKeySigner {
    key_service: Arc<dyn HolderKeyService>,
    key: HolderKey,
}

#[async_trait]
impl Sign for HolderKeySigner {
    fn algorithm(&self) -> Algorithm {
        self.key.algorithm
    }

    fn key_id(&self) -> Option<String> {
        Some(self.key.key_id.to_string())
    }

    fn public_jwk(&self) -> Option<serde_json::Value> {
        Some(self.key.public_jwk.clone())
    }

    async fn sign(&self, message: &str) -> Result<Vec<u8>> {
        self.key_service.sign(&self.key.key_id, message).await
    }
}
