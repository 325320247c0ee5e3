use std::sync::Arc;

use getset::Getters;
use oid4vc_core::identifier::Locale;
use oid4vc_core::HolderKeyService;
use oid4vci::authorization_details::AuthorizationDetailsObject;
use oid4vci::authorization_request::{authorization_url, PushedAuthorizationRequest};
use oid4vci::credential_issuer_metadata::CredentialIssuerMetadata;
use oid4vci::credential_offer::CredentialOffer;
use oid4vci::pkce::PkcePair;
use oid4vci::token::TokenRequest;
use oid4vci::wallet::Wallet;
use oid4vci::Oid4vciError;
use tracing::{debug, info};
use url::Url;

use crate::context::AgentContext;
use crate::records::{CredentialRecord, RecordError};
use crate::session::{AuthFlowSession, AuthorizationData, ClientOptions, SessionId};
use crate::storage::{AuthFlowSessionStore, CredentialRecordStore, StorageError, SESSION_TTL};

#[derive(Debug, thiserror::Error)]
pub enum IssuanceError {
    #[error(transparent)]
    Protocol(#[from] Oid4vciError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Resolver output: the offer plus the issuer metadata it references, with
/// display metadata already restricted to the requested locale.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialOfferMetadata {
    pub offer: CredentialOffer,
    pub issuer_metadata: CredentialIssuerMetadata,
}

/// Result of entering the authorization-code flow: the URL to open in the
/// user's browser, and the session id under which the flow can be resumed
/// once the redirect delivers an authorization code.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthFlowInitiation {
    pub session_id: SessionId,
    pub authorization_url: Url,
}

/// Drives issuance end to end: offer resolution, either grant, credential
/// retrieval, and persistence. Stores are passed in; the manager owns no
/// state of its own beyond its HTTP client and key service.
#[derive(Getters)]
pub struct IssuanceManager<S, R> {
    wallet: Wallet,
    key_service: Arc<dyn HolderKeyService>,
    #[getset(get = "pub")]
    sessions: S,
    #[getset(get = "pub")]
    records: R,
}

impl<S, R> IssuanceManager<S, R>
where
    S: AuthFlowSessionStore,
    R: CredentialRecordStore,
{
    pub fn new(wallet: Wallet, key_service: Arc<dyn HolderKeyService>, sessions: S, records: R) -> Self {
        Self {
            wallet,
            key_service,
            sessions,
            records,
        }
    }

    /// Parse a credential-offer URI and fetch the issuer metadata behind it.
    /// Offered configuration ids must all be present in the metadata.
    /// Display metadata is filtered to `locale`, defaulting to `en-US`.
    pub async fn resolve_offer(
        &self,
        uri: &str,
        locale: Option<Locale>,
    ) -> Result<CredentialOfferMetadata, IssuanceError> {
        let offer = self.wallet.resolve_offer(uri).await?;
        let mut issuer_metadata = self
            .wallet
            .get_credential_issuer_metadata(&offer.credential_issuer)
            .await?;
        for id in &offer.credential_configuration_ids {
            if issuer_metadata.configuration(id).is_none() {
                return Err(Oid4vciError::UnknownConfiguration(id.clone()).into());
            }
        }
        issuer_metadata.filter_display(&locale.unwrap_or_else(Locale::fallback));
        Ok(CredentialOfferMetadata {
            offer,
            issuer_metadata,
        })
    }

    /// Enter the authorization-code flow: generate PKCE material, push the
    /// authorization request, persist the session, and hand back the
    /// browser URL. No session is stored when the PAR is rejected.
    pub async fn initiate_auth_flow(
        &self,
        ctx: &AgentContext,
        offer_metadata: &CredentialOfferMetadata,
        client_options: ClientOptions,
    ) -> Result<AuthFlowInitiation, IssuanceError> {
        let offer = &offer_metadata.offer;
        let issuer_metadata = &offer_metadata.issuer_metadata;
        let grant = offer
            .grants
            .as_ref()
            .and_then(|grants| grants.authorization_code.as_ref())
            .ok_or(Oid4vciError::UnsupportedGrant)?;

        let pkce = PkcePair::generate();
        let session_id = SessionId::random();

        // Space-joined scopes of the referenced configurations; configurations
        // without a scope contribute nothing.
        let mut scopes: Vec<&str> = Vec::new();
        let mut details = Vec::new();
        for id in &offer.credential_configuration_ids {
            let configuration = issuer_metadata
                .configuration(id)
                .ok_or_else(|| Oid4vciError::UnknownConfiguration(id.clone()))?;
            if let Some(scope) = configuration.scope() {
                if !scopes.contains(&scope.as_str()) {
                    scopes.push(scope.as_str());
                }
            }
            details.push(AuthorizationDetailsObject::for_configuration(
                id,
                configuration,
                issuer_metadata.authorization_servers.clone(),
            ));
        }

        let auth_server_metadata = self
            .wallet
            .get_authorization_server_metadata(issuer_metadata)
            .await?;

        let redirect_uri = session_redirect_uri(&client_options.redirect_uri, &session_id);
        let request = PushedAuthorizationRequest::new(
            client_options.client_id.clone(),
            redirect_uri,
            &pkce,
            session_id.to_string(),
        )
        .scope(Some(scopes.join(" ")))
        .authorization_details(&details)
        .map_err(|e| Oid4vciError::OfferMalformed {
            reasons: vec![format!("authorization_details not serializable: {e}")],
        })?
        .issuer_state(grant.issuer_state.clone());

        let par_response = self
            .wallet
            .pushed_authorization_request(&auth_server_metadata, &request)
            .await?;

        let authorization_endpoint = auth_server_metadata
            .authorization_endpoint
            .clone()
            .ok_or(Oid4vciError::MissingEndpoint("authorization"))?;

        let session = AuthFlowSession::with_id(
            session_id.clone(),
            AuthorizationData {
                client_options: client_options.clone(),
                issuer_metadata: issuer_metadata.clone(),
                auth_server_metadata,
                credential_configuration_ids: offer.credential_configuration_ids.clone(),
            },
            pkce,
        );
        self.sessions.store(ctx, &session).await?;
        debug!(session = %session_id, "authorization flow initiated");

        let authorization_url = authorization_url(
            &authorization_endpoint,
            &client_options.client_id,
            &par_response.request_uri,
        );
        Ok(AuthFlowInitiation {
            session_id,
            authorization_url,
        })
    }

    /// Resume the flow with the authorization code from the redirect:
    /// exchange it at the token endpoint, request one credential per
    /// configuration referenced by the session, persist each record, then
    /// delete the session. Token-endpoint failures keep the session around
    /// for a retry; credential-endpoint failures are terminal.
    pub async fn request_credential(
        &self,
        ctx: &AgentContext,
        session_id: &SessionId,
        code: String,
    ) -> Result<Vec<CredentialRecord>, IssuanceError> {
        let session = self.sessions.get(ctx, session_id).await?;
        let AuthorizationData {
            client_options,
            issuer_metadata,
            auth_server_metadata,
            credential_configuration_ids,
        } = session.authorization_data;

        let redirect_uri = session_redirect_uri(&client_options.redirect_uri, session_id);
        let token_request = TokenRequest::authorization_code(
            code,
            client_options.client_id.clone(),
            redirect_uri,
            session.pkce.verifier().to_string(),
        );
        let token_response = self
            .wallet
            .get_access_token(&auth_server_metadata, &token_request)
            .await?;

        let mut records = Vec::with_capacity(credential_configuration_ids.len());
        for id in &credential_configuration_ids {
            let configuration = issuer_metadata
                .configuration(id)
                .ok_or_else(|| Oid4vciError::UnknownConfiguration(id.clone()))?;
            let issued = match self
                .wallet
                .get_credential(
                    &issuer_metadata,
                    &token_response,
                    configuration,
                    self.key_service.clone(),
                    Some(&client_options.client_id),
                )
                .await
            {
                Ok(issued) => issued,
                Err(error) => {
                    if matches!(error, Oid4vciError::CredentialRequestFailed { .. }) {
                        self.sessions.delete(ctx, session_id).await?;
                    }
                    return Err(error.into());
                }
            };
            let record = CredentialRecord::from_issued(issued, configuration.display().to_vec(), None)?;
            self.records.save(ctx, &record).await?;
            records.push(record);
        }

        self.sessions.delete(ctx, session_id).await?;
        info!(session = %session_id, count = records.len(), "issuance flow completed");
        Ok(records)
    }

    /// Pre-authorized-code flow: no PAR, no PKCE, no session. Only the first
    /// configuration id of the offer is honored here, while the
    /// authorization-code flow iterates all of them.
    pub async fn accept_offer(
        &self,
        ctx: &AgentContext,
        offer_metadata: &CredentialOfferMetadata,
        tx_code: Option<String>,
    ) -> Result<CredentialRecord, IssuanceError> {
        let grant = offer_metadata
            .offer
            .grants
            .as_ref()
            .and_then(|grants| grants.pre_authorized_code.as_ref())
            .ok_or(Oid4vciError::UnsupportedGrant)?;
        let configuration_id = offer_metadata
            .offer
            .credential_configuration_ids
            .first()
            .ok_or_else(|| Oid4vciError::OfferMalformed {
                reasons: vec!["credential_configuration_ids must not be empty".to_string()],
            })?;
        let configuration = offer_metadata
            .issuer_metadata
            .configuration(configuration_id)
            .ok_or_else(|| Oid4vciError::UnknownConfiguration(configuration_id.clone()))?;

        let auth_server_metadata = self
            .wallet
            .get_authorization_server_metadata(&offer_metadata.issuer_metadata)
            .await?;
        let token_request = TokenRequest::pre_authorized_code(grant.pre_authorized_code.clone(), tx_code);
        let token_response = self
            .wallet
            .get_access_token(&auth_server_metadata, &token_request)
            .await?;

        let issued = self
            .wallet
            .get_credential(
                &offer_metadata.issuer_metadata,
                &token_response,
                configuration,
                self.key_service.clone(),
                None,
            )
            .await?;
        let record = CredentialRecord::from_issued(issued, configuration.display().to_vec(), None)?;
        self.records.save(ctx, &record).await?;
        info!(credential = %record.credential_id(), "pre-authorized issuance completed");
        Ok(record)
    }

    /// Explicitly abandon a pending flow (Pending → Expired).
    pub async fn abandon_flow(&self, ctx: &AgentContext, session_id: &SessionId) -> Result<(), IssuanceError> {
        self.sessions.delete(ctx, session_id).await?;
        Ok(())
    }

    /// Collect sessions older than the recommended TTL.
    pub async fn purge_expired_sessions(&self, ctx: &AgentContext) -> Result<usize, IssuanceError> {
        Ok(self.sessions.purge_expired(ctx, SESSION_TTL).await?)
    }
}

/// The redirect URI used in both the PAR and the token request, carrying the
/// session id so the wallet can resume the flow after the redirect.
fn session_redirect_uri(redirect_uri: &Url, session_id: &SessionId) -> Url {
    let mut url = redirect_uri.clone();
    url.set_query(Some(&format!("session={session_id}")));
    url
}
