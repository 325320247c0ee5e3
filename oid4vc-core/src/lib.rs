pub mod authentication;
pub mod cbor;
pub mod crypto;
pub mod identifier;
pub mod jwt;
pub mod rfc7519_claims;

pub use authentication::{
    key_service::{HolderKey, HolderKeyService},
    sign::Sign,
};
pub use rfc7519_claims::RFC7519Claims;
use serde::Serialize;

// Macro that generates a builder function for a field.
#[macro_export]
macro_rules! builder_fn {
    ($name:ident, $ty:ty) => {
        #[allow(clippy::should_implement_trait)]
        pub fn $name(mut self, value: impl Into<$ty>) -> Self {
            self.$name.replace(value.into());
            self
        }
    };
    ($field:ident, $name:ident, $ty:ty) => {
        #[allow(clippy::should_implement_trait)]
        pub fn $name(mut self, value: impl Into<$ty>) -> Self {
            self.$field.$name.replace(value.into());
            self
        }
    };
}

// Helper function that allows to serialize custom structs into a query value.
// Compact JSON; string values keep their whitespace.
pub fn to_query_value<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string(value).map_err(|e| e.into())
}
