use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// The registered JWT claims of [RFC 7519, section 4.1](https://tools.ietf.org/html/rfc7519#section-4.1),
/// all optional. The proof-of-possession JWT fills `iss` (the wallet's
/// client id, when it has one), `aud` (the credential issuer) and `iat`;
/// which claims a given token requires is decided by its builder, not here.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone, Getters)]
#[getset(get = "pub")]
pub struct RFC7519Claims {
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub aud: Option<String>,
    /// Expiration and not-before are numeric dates, seconds since the epoch.
    pub exp: Option<i64>,
    pub nbf: Option<i64>,
    pub iat: Option<i64>,
    pub jti: Option<String>,
}
