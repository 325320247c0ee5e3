use oid4vc_core::identifier::{DocType, Vct};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::credential_issuer_metadata::CredentialConfiguration;

/// Represents the `openid_credential` field of the `AuthorizationDetailsObject`.
#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Default, Clone)]
pub enum OpenidCredential {
    #[default]
    #[serde(rename = "openid_credential")]
    Type,
}

/// Represents an object of the `authorization_details` field of the authorization request
/// as described in [OpenID4VCI](https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-request-issuance-of-a-certa)
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct AuthorizationDetailsObject {
    pub r#type: OpenidCredential,
    pub credential_configuration_id: String,
    pub format: Option<String>,
    pub vct: Option<Vct>,
    pub doctype: Option<DocType>,
    pub locations: Option<Vec<Url>>,
}

impl AuthorizationDetailsObject {
    /// One entry per referenced configuration: SD-JWT entries carry the
    /// `vct`, mdoc entries the `doctype`.
    pub fn for_configuration(
        id: &str,
        configuration: &CredentialConfiguration,
        locations: Option<Vec<Url>>,
    ) -> Self {
        let (vct, doctype) = match configuration {
            CredentialConfiguration::SdJwt(c) => (Some(c.vct.clone()), None),
            CredentialConfiguration::MsoMdoc(c) => (None, Some(c.doctype.clone())),
        };
        Self {
            r#type: OpenidCredential::Type,
            credential_configuration_id: id.to_string(),
            format: None,
            vct,
            doctype,
            locations,
        }
    }
}
