use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::authorization_details::AuthorizationDetailsObject;
use crate::pkce::PkcePair;

/// Body of a Pushed Authorization Request (RFC 9126), sent form-url-encoded.
/// `authorization_details` is itself JSON-encoded inside the form, and
/// `state` carries the wallet's session id so the flow can be resumed after
/// the browser redirect.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct PushedAuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: Url,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub state: String,
    pub scope: Option<String>,
    pub authorization_details: Option<String>,
    pub issuer_state: Option<String>,
}

impl PushedAuthorizationRequest {
    pub fn new(client_id: String, redirect_uri: Url, pkce: &PkcePair, state: String) -> Self {
        Self {
            client_id,
            redirect_uri,
            code_challenge: pkce.challenge().to_string(),
            code_challenge_method: PkcePair::CODE_CHALLENGE_METHOD.to_string(),
            state,
            scope: None,
            authorization_details: None,
            issuer_state: None,
        }
    }

    pub fn scope(mut self, scope: Option<String>) -> Self {
        self.scope = scope.filter(|s| !s.is_empty());
        self
    }

    pub fn authorization_details(
        mut self,
        details: &[AuthorizationDetailsObject],
    ) -> Result<Self, serde_json::Error> {
        self.authorization_details = Some(serde_json::to_string(details)?);
        Ok(self)
    }

    pub fn issuer_state(mut self, issuer_state: Option<String>) -> Self {
        self.issuer_state = issuer_state;
        self
    }
}

/// Successful PAR response (RFC 9126 section 2.2).
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct PushedAuthorizationResponse {
    pub request_uri: String,
    pub expires_in: Option<u64>,
}

/// `<authorization_endpoint>?client_id=<cid>&request_uri=<urlencoded>`, the
/// URL the embedder opens in the user's browser.
pub fn authorization_url(authorization_endpoint: &Url, client_id: &str, request_uri: &str) -> Url {
    let mut url = authorization_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("request_uri", request_uri);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_par_body_is_form_encodable() {
        let pkce = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        let request = PushedAuthorizationRequest::new(
            "wallet".to_string(),
            "https://wallet.example.org/redirect".parse().unwrap(),
            &pkce,
            "session-1".to_string(),
        )
        .scope(Some("pid mdl".to_string()));

        let encoded = serde_urlencoded::to_string(&request).unwrap();
        assert!(encoded.contains("client_id=wallet"));
        assert!(encoded.contains("code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"));
        assert!(encoded.contains("code_challenge_method=S256"));
        assert!(encoded.contains("state=session-1"));
        assert!(encoded.contains("scope=pid+mdl"));
        assert!(!encoded.contains("issuer_state"));
    }

    #[test]
    fn test_empty_scope_is_omitted() {
        let pkce = PkcePair::generate();
        let request = PushedAuthorizationRequest::new(
            "wallet".to_string(),
            "https://wallet.example.org/redirect".parse().unwrap(),
            &pkce,
            "session-1".to_string(),
        )
        .scope(Some(String::new()));
        assert_eq!(request.scope, None);
    }

    #[test]
    fn test_authorization_url_encodes_request_uri() {
        let url = authorization_url(
            &"https://as.example.org/authorize".parse().unwrap(),
            "wallet",
            "urn:ietf:params:oauth:request_uri:abc",
        );
        assert_eq!(
            url.as_str(),
            "https://as.example.org/authorize?client_id=wallet&request_uri=urn%3Aietf%3Aparams%3Aoauth%3Arequest_uri%3Aabc"
        );
    }
}
