use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use oid4vc_core::HolderKeyService;
use reqwest::{Client, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::authorization_request::{PushedAuthorizationRequest, PushedAuthorizationResponse};
use crate::authorization_server_metadata::{derived_metadata_url, AuthorizationServerMetadata};
use crate::credential::{CredentialRequest, CredentialResponse, IssuedCredential};
use crate::credential_issuer_metadata::{CredentialConfiguration, CredentialIssuerMetadata};
use crate::credential_offer::{CredentialOffer, CredentialOfferQuery};
use crate::error::Oid4vciError;
use crate::proof::Proof;
use crate::token::{ErrorResponse, TokenRequest, TokenResponse};

/// Bound on every network operation of the wallet.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const METADATA_RETRIES: u32 = 3;

/// Stateless protocol client for the holder side of OpenID4VCI. Flow state
/// (sessions, stored credentials) lives with the caller; this type only
/// talks to the issuer and its authorization server.
pub struct Wallet {
    client: Client,
    metadata_client: ClientWithMiddleware,
}

impl Wallet {
    pub fn new() -> Result<Self, Oid4vciError> {
        let client = Client::builder().timeout(DEFAULT_HTTP_TIMEOUT).build()?;
        // Metadata documents are fetched with GET and are safe to retry;
        // the POST endpoints are not.
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(METADATA_RETRIES);
        let metadata_client = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(Self {
            client,
            metadata_client,
        })
    }

    /// Parse a credential-offer URI, fetching the offer when it is passed by
    /// reference, and reject offers without a usable grant.
    pub async fn resolve_offer(&self, uri: &str) -> Result<CredentialOffer, Oid4vciError> {
        let offer = match uri.parse::<CredentialOfferQuery>()? {
            CredentialOfferQuery::CredentialOffer(offer) => offer,
            CredentialOfferQuery::CredentialOfferUri(url) => self.get_json(url).await?,
        };
        offer.validate()?;
        debug!(issuer = %offer.credential_issuer, "resolved credential offer");
        Ok(offer)
    }

    pub async fn get_credential_issuer_metadata(
        &self,
        credential_issuer: &Url,
    ) -> Result<CredentialIssuerMetadata, Oid4vciError> {
        let url = format!(
            "{}/.well-known/openid-credential-issuer",
            credential_issuer.as_str().trim_end_matches('/')
        )
        .parse()
        .map_err(Oid4vciError::InvalidMetadataUrl)?;
        self.get_json(url).await
    }

    /// Metadata of the authorization server the issuer delegates to. When the
    /// issuer metadata lists no servers, the metadata URL is derived from the
    /// issuer identifier itself.
    pub async fn get_authorization_server_metadata(
        &self,
        issuer_metadata: &CredentialIssuerMetadata,
    ) -> Result<AuthorizationServerMetadata, Oid4vciError> {
        let server = issuer_metadata
            .authorization_servers
            .as_ref()
            .and_then(|servers| servers.first())
            .unwrap_or(&issuer_metadata.credential_issuer);
        let url = derived_metadata_url(server)?;
        self.get_json(url).await
    }

    pub async fn pushed_authorization_request(
        &self,
        auth_server_metadata: &AuthorizationServerMetadata,
        request: &PushedAuthorizationRequest,
    ) -> Result<PushedAuthorizationResponse, Oid4vciError> {
        let endpoint = auth_server_metadata
            .pushed_authorization_request_endpoint
            .as_ref()
            .ok_or(Oid4vciError::MissingEndpoint("pushed_authorization_request"))?;
        debug!(%endpoint, "pushing authorization request");
        let response = self.client.post(endpoint.clone()).form(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Oid4vciError::PushedAuthorizationFailed {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    pub async fn get_access_token(
        &self,
        auth_server_metadata: &AuthorizationServerMetadata,
        token_request: &TokenRequest,
    ) -> Result<TokenResponse, Oid4vciError> {
        let endpoint = &auth_server_metadata.token_endpoint;
        debug!(%endpoint, "exchanging grant for access token");
        let response = self
            .client
            .post(endpoint.clone())
            .form(token_request)
            .send()
            .await?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(error) => Oid4vciError::TokenExchangeFailed {
                    error: error.error,
                    description: error.error_description,
                },
                Err(_) => Oid4vciError::TokenExchangeFailed {
                    error: format!("HTTP {}", status.as_u16()),
                    description: Some(body),
                },
            });
        }
        Ok(response.json().await?)
    }

    /// Request one credential for the given configuration: provision a fresh
    /// holder key, bind it into the proof of possession, dispatch and decode
    /// the issuer's response.
    pub async fn get_credential(
        &self,
        issuer_metadata: &CredentialIssuerMetadata,
        token_response: &TokenResponse,
        configuration: &CredentialConfiguration,
        key_service: Arc<dyn HolderKeyService>,
        client_id: Option<&str>,
    ) -> Result<IssuedCredential, Oid4vciError> {
        let c_nonce = token_response
            .c_nonce
            .clone()
            .ok_or(Oid4vciError::MissingNonce)?;
        let key = key_service.generate_key().await.map_err(Oid4vciError::Proof)?;

        let mut builder = Proof::builder()
            .key_service(key_service.clone())
            .key(key.clone())
            .aud(issuer_metadata.credential_issuer.to_string())
            .iat(Utc::now().timestamp())
            .nonce(c_nonce);
        if let Some(client_id) = client_id {
            builder = builder.iss(client_id.to_string());
        }
        let proof = builder.build().await.map_err(Oid4vciError::Proof)?;

        let request = CredentialRequest::for_configuration(configuration, proof);
        let endpoint = &issuer_metadata.credential_endpoint;
        debug!(%endpoint, credential_format = %request.format, "requesting credential");
        let response = self
            .client
            .post(endpoint.clone())
            .bearer_auth(token_response.access_token.as_str())
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Oid4vciError::CredentialRequestFailed {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let credential_response: CredentialResponse = response.json().await?;
        let payload = credential_response.into_payload(configuration)?;
        Ok(IssuedCredential {
            key_id: key.key_id,
            credential: payload,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Oid4vciError> {
        let response = self.metadata_client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Oid4vciError::MetadataFetchFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn issuer_metadata_mock(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-credential-issuer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "credential_issuer": server.uri(),
                "credential_endpoint": format!("{}/credential", server.uri()),
                "credential_configurations_supported": {
                    "eu.europa.ec.eudi.pid.1": { "format": "vc+sd-jwt", "vct": "EU.PID", "scope": "pid" }
                }
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_offer_by_reference_is_fetched_and_validated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/offers/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "credential_issuer": server.uri(),
                "credential_configuration_ids": ["eu.europa.ec.eudi.pid.1"],
                "grants": {
                    "urn:ietf:params:oauth:grant-type:pre-authorized_code": { "pre-authorized_code": "abc" }
                }
            })))
            .mount(&server)
            .await;

        let wallet = Wallet::new().unwrap();
        let uri = format!(
            "openid-credential-offer://?credential_offer_uri={}",
            urlencoded(&format!("{}/offers/1", server.uri()))
        );
        let offer = wallet.resolve_offer(&uri).await.unwrap();
        assert_eq!(offer.credential_configuration_ids, vec!["eu.europa.ec.eudi.pid.1"]);
    }

    #[tokio::test]
    async fn test_authorization_server_metadata_falls_back_to_derived_url() {
        let server = MockServer::start().await;
        issuer_metadata_mock(&server).await;
        Mock::given(method("GET"))
            .and(path("/.well-known/oauth-authorization-server"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issuer": server.uri(),
                "token_endpoint": format!("{}/token", server.uri()),
                "authorization_endpoint": format!("{}/authorize", server.uri()),
                "pushed_authorization_request_endpoint": format!("{}/par", server.uri()),
            })))
            .mount(&server)
            .await;

        let wallet = Wallet::new().unwrap();
        let issuer_url: Url = server.uri().parse().unwrap();
        let issuer_metadata = wallet.get_credential_issuer_metadata(&issuer_url).await.unwrap();
        assert!(issuer_metadata.authorization_servers.is_none());

        let auth_server_metadata = wallet
            .get_authorization_server_metadata(&issuer_metadata)
            .await
            .unwrap();
        assert_eq!(
            auth_server_metadata.token_endpoint.as_str(),
            format!("{}/token", server.uri())
        );
    }

    #[tokio::test]
    async fn test_metadata_fetch_failure_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/openid-credential-issuer"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let wallet = Wallet::new().unwrap();
        let issuer_url: Url = server.uri().parse().unwrap();
        let error = wallet.get_credential_issuer_metadata(&issuer_url).await.unwrap_err();
        assert_matches!(error, Oid4vciError::MetadataFetchFailed { status: 404, .. });
    }

    #[tokio::test]
    async fn test_token_error_body_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "unknown pre-authorized code"
            })))
            .mount(&server)
            .await;

        let wallet = Wallet::new().unwrap();
        let auth_server_metadata: AuthorizationServerMetadata = serde_json::from_value(json!({
            "issuer": server.uri(),
            "token_endpoint": format!("{}/token", server.uri()),
        }))
        .unwrap();
        let token_request = TokenRequest::pre_authorized_code("bad".to_string(), None);
        let error = wallet
            .get_access_token(&auth_server_metadata, &token_request)
            .await
            .unwrap_err();
        assert_matches!(
            error,
            Oid4vciError::TokenExchangeFailed { error, description }
                if error == "invalid_grant" && description.as_deref() == Some("unknown pre-authorized code")
        );
    }

    #[tokio::test]
    async fn test_par_failure_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/par"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_request"))
            .mount(&server)
            .await;

        let wallet = Wallet::new().unwrap();
        let auth_server_metadata: AuthorizationServerMetadata = serde_json::from_value(json!({
            "issuer": server.uri(),
            "token_endpoint": format!("{}/token", server.uri()),
            "pushed_authorization_request_endpoint": format!("{}/par", server.uri()),
        }))
        .unwrap();
        let request = PushedAuthorizationRequest::new(
            "wallet".to_string(),
            "https://wallet.example.org/redirect".parse().unwrap(),
            &crate::pkce::PkcePair::generate(),
            "session-1".to_string(),
        );
        let error = wallet
            .pushed_authorization_request(&auth_server_metadata, &request)
            .await
            .unwrap_err();
        assert_matches!(
            error,
            Oid4vciError::PushedAuthorizationFailed { status: 400, body } if body == "invalid_request"
        );
    }

    fn urlencoded(input: &str) -> String {
        let mut url = Url::parse("scratch://x").unwrap();
        url.query_pairs_mut().append_pair("v", input);
        url.query().unwrap().trim_start_matches("v=").to_string()
    }
}
