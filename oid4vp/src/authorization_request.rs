use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use getset::Getters;
use jsonwebtoken::Header;
use oid4vc_core::jwt;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use url::Url;

use crate::error::Oid4vpError;

/// OpenID4VP client identifier schemes. Only the two X.509 SAN schemes can
/// be authenticated by this crate; others are carried for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientIdScheme {
    X509SanDns,
    X509SanUri,
    #[serde(untagged)]
    Other(String),
}

/// Payload of a signed OpenID4VP authorization request object as described here:
/// https://openid.net/specs/openid-4-verifiable-presentations-1_0.html#name-authorization-request
///
/// The presentation query (`presentation_definition` or `dcql_query`) is
/// carried opaquely; evaluating it is not this crate's concern.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestObjectClaims {
    pub client_id: String,
    pub client_id_scheme: ClientIdScheme,
    pub nonce: String,
    pub response_type: Option<String>,
    pub response_mode: Option<String>,
    pub response_uri: Option<Url>,
    pub redirect_uri: Option<Url>,
    pub state: Option<String>,
    pub presentation_definition: Option<serde_json::Value>,
    pub dcql_query: Option<serde_json::Value>,
    pub client_metadata: Option<serde_json::Value>,
}

/// A verifier's signed request object: the raw compact JWS plus its decoded
/// header and claims. The validation methods in [`crate::validation`] are
/// pure over these bytes and the clock, so each is independently replayable.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct RequestObject {
    jws: String,
    header: Header,
    claims: RequestObjectClaims,
}

impl RequestObject {
    /// Decode header and claims without any signature or trust decisions.
    pub fn parse(jws: &str) -> Result<Self, Oid4vpError> {
        let header = jwt::decode_header(jws)
            .map_err(|e| Oid4vpError::MalformedRequestObject(e.to_string()))?;
        let claims = jwt::claims_unverified(jws)
            .map_err(|e| Oid4vpError::MalformedRequestObject(e.to_string()))?;
        Ok(Self {
            jws: jws.to_string(),
            header,
            claims,
        })
    }

    /// The DER certificates of the `x5c` header, leaf first.
    pub fn certificate_chain_der(&self) -> Result<Vec<Vec<u8>>, Oid4vpError> {
        let x5c = self
            .header
            .x5c
            .as_ref()
            .filter(|chain| !chain.is_empty())
            .ok_or(Oid4vpError::MissingCertificateChain)?;
        x5c.iter()
            .map(|certificate| {
                STANDARD
                    .decode(certificate)
                    .map_err(|e| Oid4vpError::CertificateParse(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_client_id_scheme_deserialization() {
        assert_eq!(
            serde_json::from_str::<ClientIdScheme>(r#""x509_san_dns""#).unwrap(),
            ClientIdScheme::X509SanDns
        );
        assert_eq!(
            serde_json::from_str::<ClientIdScheme>(r#""x509_san_uri""#).unwrap(),
            ClientIdScheme::X509SanUri
        );
        assert_eq!(
            serde_json::from_str::<ClientIdScheme>(r#""redirect_uri""#).unwrap(),
            ClientIdScheme::Other("redirect_uri".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_non_jws_input() {
        assert_matches!(
            RequestObject::parse("definitely not a JWS"),
            Err(Oid4vpError::MalformedRequestObject(_))
        );
    }

    #[test]
    fn test_missing_x5c_is_reported() {
        // Unsigned-looking JWS with a minimal header; signature is irrelevant here.
        let header = oid4vc_core::crypto::base64url_encode(br#"{"alg":"ES256"}"#);
        let claims = oid4vc_core::crypto::base64url_encode(
            br#"{"client_id":"example.com","client_id_scheme":"x509_san_dns","nonce":"n"}"#,
        );
        let jws = format!("{header}.{claims}.c2ln");
        let request_object = RequestObject::parse(&jws).unwrap();
        assert_matches!(
            request_object.certificate_chain_der(),
            Err(Oid4vpError::MissingCertificateChain)
        );
    }
}
