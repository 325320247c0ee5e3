pub mod authorization_details;
pub mod authorization_request;
pub mod authorization_server_metadata;
pub mod credential;
pub mod credential_issuer_metadata;
pub mod credential_offer;
pub mod error;
pub mod pkce;
pub mod proof;
pub mod token;
pub mod wallet;

pub use credential::{CredentialPayload, IssuedCredential};
pub use error::Oid4vciError;
pub use proof::Proof;
pub use wallet::Wallet;
