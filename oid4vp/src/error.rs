/// Failure surface of request-object authentication. Every check is terminal
/// for the request at hand.
#[derive(Debug, thiserror::Error)]
pub enum Oid4vpError {
    #[error("request object is not a valid signed JWT: {0}")]
    MalformedRequestObject(String),
    #[error("x5c header is missing or empty")]
    MissingCertificateChain,
    #[error("certificate could not be parsed: {0}")]
    CertificateParse(String),
    #[error("algorithm {0:?} is not allowed for request objects")]
    UnsupportedAlgorithm(jsonwebtoken::Algorithm),
    #[error("request object signature is invalid")]
    InvalidSignature,
    #[error("trust chain validation failed: {0}")]
    TrustChainInvalid(String),
    #[error("client_id is not bound to the leaf certificate's SAN")]
    ClientIdBindingMismatch,
    #[error("client_id_scheme {0:?} is not an X.509 SAN scheme")]
    UnsupportedClientIdScheme(String),
}
