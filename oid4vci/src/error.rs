/// Failure surface of the issuance flows. Protocol errors preserve what the
/// server sent; everything here is terminal for the current call except where
/// the caller explicitly retries.
#[derive(Debug, thiserror::Error)]
pub enum Oid4vciError {
    #[error("malformed credential offer: {}", .reasons.join("; "))]
    OfferMalformed { reasons: Vec<String> },
    #[error("failed to fetch metadata document {url} (status {status})")]
    MetadataFetchFailed { url: String, status: u16 },
    #[error("pushed authorization request failed (status {status}): {body}")]
    PushedAuthorizationFailed { status: u16, body: String },
    #[error("error requesting access token: {error}: {}", .description.as_deref().unwrap_or("(no description)"))]
    TokenExchangeFailed {
        error: String,
        description: Option<String>,
    },
    #[error("credential request failed (status {status}): {body}")]
    CredentialRequestFailed { status: u16, body: String },
    #[error("issuer deferred issuance (transaction id {transaction_id}), which is not supported")]
    DeferredIssuanceNotSupported { transaction_id: String },
    #[error("failed to decode {format} credential: {reason}")]
    DecodeFailed {
        format: &'static str,
        reason: String,
    },
    #[error("token response is missing the c_nonce required for the proof of possession")]
    MissingNonce,
    #[error("credential configuration {0} is not present in the issuer metadata")]
    UnknownConfiguration(String),
    #[error("the offer carries no grant usable for this flow")]
    UnsupportedGrant,
    #[error("authorization server metadata has no {0} endpoint")]
    MissingEndpoint(&'static str),
    #[error("could not construct metadata URL: {0}")]
    InvalidMetadataUrl(#[source] url::ParseError),
    #[error("proof of possession could not be produced: {0}")]
    Proof(#[source] anyhow::Error),
    #[error("HTTP request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("transport error: {0}")]
    Middleware(#[source] anyhow::Error),
}

impl From<reqwest::Error> for Oid4vciError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

impl From<reqwest_middleware::Error> for Oid4vciError {
    fn from(error: reqwest_middleware::Error) -> Self {
        match error {
            reqwest_middleware::Error::Reqwest(error) => error.into(),
            reqwest_middleware::Error::Middleware(error) => Self::Middleware(error),
        }
    }
}
