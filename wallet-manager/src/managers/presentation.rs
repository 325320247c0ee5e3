use oid4vp::{Oid4vpError, RequestObject};
use tracing::debug;

/// Authenticates verifier request objects on behalf of the wallet: the
/// conjunction of the signature, trust-chain and SAN-binding checks. The
/// individual checks remain callable on [`RequestObject`] for replay.
#[derive(Debug, Default)]
pub struct PresentationManager;

impl PresentationManager {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_request_object(&self, jws: &str) -> Result<RequestObject, Oid4vpError> {
        let request_object = RequestObject::parse(jws)?;
        request_object.authenticate()?;
        debug!(client_id = %request_object.claims().client_id, "request object authenticated");
        Ok(request_object)
    }
}
