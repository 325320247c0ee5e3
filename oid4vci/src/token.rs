use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use url::Url;

/// Access token issued by the token endpoint. `Debug` deliberately does not
/// print the inner value.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<redacted>)")
    }
}

/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-token-request
/// and https://www.rfc-editor.org/rfc/rfc6749.html#section-4.1.3.
/// Sent URL-encoded in the request body to POST /token.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenRequest {
    #[serde(flatten)]
    pub grant_type: TokenRequestGrantType,

    pub code_verifier: Option<String>,
    pub client_id: Option<String>,

    /// MUST be the redirect URI value as passed to the authorization request.
    pub redirect_uri: Option<Url>,

    /// Transaction code shown to the user in the pre-authorized code flow.
    pub tx_code: Option<String>,
}

impl TokenRequest {
    pub fn authorization_code(
        code: String,
        client_id: String,
        redirect_uri: Url,
        code_verifier: String,
    ) -> Self {
        Self {
            grant_type: TokenRequestGrantType::AuthorizationCode { code },
            code_verifier: Some(code_verifier),
            client_id: Some(client_id),
            redirect_uri: Some(redirect_uri),
            tx_code: None,
        }
    }

    pub fn pre_authorized_code(pre_authorized_code: String, tx_code: Option<String>) -> Self {
        Self {
            grant_type: TokenRequestGrantType::PreAuthorizedCode { pre_authorized_code },
            code_verifier: None,
            client_id: None,
            redirect_uri: None,
            tx_code,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "grant_type")]
pub enum TokenRequestGrantType {
    #[serde(rename = "authorization_code")]
    AuthorizationCode { code: String },
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    PreAuthorizedCode {
        #[serde(rename = "pre-authorized_code")]
        pre_authorized_code: String,
    },
}

/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-successful-token-response
/// and https://www.rfc-editor.org/rfc/rfc6749.html#section-5.1
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,

    /// Proof-of-possession nonce consumed when building the credential request.
    pub c_nonce: Option<String>,
    pub c_nonce_expires_in: Option<u64>,
}

/// RFC 6749 error document, as returned by the token endpoint on 4xx/5xx.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}
