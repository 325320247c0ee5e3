use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("not a well-formed BCP 47 language tag: {0}")]
    InvalidLocale(String),
}

// Validated non-empty string identifier. Construction goes through `new`;
// serde deserialization runs the same validation.
macro_rules! string_identifier {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdentifierError::Empty($label));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_identifier!(KeyId, "key id");
string_identifier!(CredentialSetId, "credential set id");
string_identifier!(DocType, "doc type");
string_identifier!(Vct, "vct");
string_identifier!(CredentialScope, "scope");

impl CredentialSetId {
    /// A fresh set id, grouping batch-issued copies of one logical credential.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Local identifier of a stored credential. Freshly generated at record
/// construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(Uuid);

impl CredentialId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BCP 47 language tag, e.g. `en-US`. Only the tag shape is validated;
/// subtag registry lookups are out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Result<Self, IdentifierError> {
        let tag = tag.into();
        let mut subtags = tag.split('-');
        let primary_ok = subtags
            .next()
            .is_some_and(|primary| !primary.is_empty() && primary.len() <= 8 && primary.chars().all(|c| c.is_ascii_alphabetic()));
        let rest_ok = subtags.all(|subtag| {
            !subtag.is_empty() && subtag.len() <= 8 && subtag.chars().all(|c| c.is_ascii_alphanumeric())
        });
        if !primary_ok || !rest_ok {
            return Err(IdentifierError::InvalidLocale(tag));
        }
        Ok(Self(tag))
    }

    /// The locale display metadata falls back to when no requested locale matches.
    pub fn fallback() -> Self {
        Self("en-US".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language tags compare case-insensitively.
    pub fn matches(&self, tag: &str) -> bool {
        self.0.eq_ignore_ascii_case(tag)
    }
}

impl TryFrom<String> for Locale {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
