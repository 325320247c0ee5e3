use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use oid4vc_core::crypto;
use oid4vci::authorization_server_metadata::AuthorizationServerMetadata;
use oid4vci::credential_issuer_metadata::CredentialIssuerMetadata;
use oid4vci::pkce::PkcePair;
use serde::{Deserialize, Serialize};
use url::Url;

/// Handle of an in-flight authorization-code flow: 128 bits of CSPRNG
/// output, base64url-encoded. Travels as the OAuth `state` parameter and in
/// the redirect URI's `session` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn random() -> Self {
        Self(crypto::random_token(16))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static OAuth client settings of this wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOptions {
    pub client_id: String,
    pub redirect_uri: Url,
}

/// Everything needed to resume the flow once the browser redirect returns
/// an authorization code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationData {
    pub client_options: ClientOptions,
    pub issuer_metadata: CredentialIssuerMetadata,
    pub auth_server_metadata: AuthorizationServerMetadata,
    pub credential_configuration_ids: Vec<String>,
}

/// A stored flow session. Created when the PAR has been accepted, deleted
/// after a successful token exchange or explicit abandonment, collected by
/// TTL otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthFlowSession {
    pub session_id: SessionId,
    pub authorization_data: AuthorizationData,
    pub pkce: PkcePair,
    pub created_at: DateTime<Utc>,
}

impl AuthFlowSession {
    pub fn with_id(
        session_id: SessionId,
        authorization_data: AuthorizationData,
        pkce: PkcePair,
    ) -> Self {
        Self {
            session_id,
            authorization_data,
            pkce,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Utc::now().signed_duration_since(self.created_at) >= ttl
    }
}
