use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::error::Oid4vciError;

/// Authorization Server Metadata (RFC 8414). Fields this crate does not act
/// on are carried verbatim in `additional`.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuthorizationServerMetadata {
    pub issuer: Url,
    pub token_endpoint: Url,
    pub authorization_endpoint: Option<Url>,
    pub pushed_authorization_request_endpoint: Option<Url>,
    pub code_challenge_methods_supported: Option<Vec<String>>,
    pub grant_types_supported: Option<Vec<String>>,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

/// Well-known metadata URL for an authorization server or credential issuer:
/// the `/.well-known/oauth-authorization-server` document sits on the
/// authority when the path is empty, and carries the path as a suffix (minus
/// any trailing `/`) otherwise.
pub fn derived_metadata_url(issuer: &Url) -> Result<Url, Oid4vciError> {
    let origin = issuer.origin().ascii_serialization();
    let path = issuer.path().trim_end_matches('/');
    let derived = if path.is_empty() {
        format!("{origin}/.well-known/oauth-authorization-server")
    } else {
        format!("{origin}/.well-known/oauth-authorization-server{path}")
    };
    derived.parse().map_err(Oid4vciError::InvalidMetadataUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_url_for_bare_authority() {
        let url = derived_metadata_url(&"https://as.example.org".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://as.example.org/.well-known/oauth-authorization-server");
    }

    #[test]
    fn test_derived_url_for_root_path() {
        let url = derived_metadata_url(&"https://as.example.org/".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://as.example.org/.well-known/oauth-authorization-server");
    }

    #[test]
    fn test_derived_url_keeps_path_suffix() {
        let url = derived_metadata_url(&"https://as.example.org/tenant/a".parse().unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://as.example.org/.well-known/oauth-authorization-server/tenant/a"
        );
    }

    #[test]
    fn test_derived_url_strips_trailing_slash() {
        let url = derived_metadata_url(&"https://as.example.org/tenant/".parse().unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://as.example.org/.well-known/oauth-authorization-server/tenant"
        );
    }

    #[test]
    fn test_derived_url_keeps_port() {
        let url = derived_metadata_url(&"http://localhost:8080/issuer".parse().unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/.well-known/oauth-authorization-server/issuer"
        );
    }
}
