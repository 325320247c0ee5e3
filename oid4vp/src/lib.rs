pub mod authorization_request;
pub mod error;
pub mod validation;

pub use authorization_request::{ClientIdScheme, RequestObject, RequestObjectClaims};
pub use error::Oid4vpError;
pub use validation::ALLOWED_ALGORITHMS;
