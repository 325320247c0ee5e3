use oid4vc_core::to_query_value;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

use crate::error::Oid4vciError;

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct AuthorizationCodeGrant {
    pub issuer_state: Option<String>,
}

/// Prompt descriptor for the transaction code bound to a pre-authorized
/// code. Rendering the prompt is the embedder's concern.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct TxCode {
    pub input_mode: Option<String>,
    pub length: Option<u32>,
    pub description: Option<String>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone)]
pub struct PreAuthorizedCodeGrant {
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,
    pub tx_code: Option<TxCode>,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Eq, PartialEq, Clone)]
pub struct Grants {
    pub authorization_code: Option<AuthorizationCodeGrant>,
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    pub pre_authorized_code: Option<PreAuthorizedCodeGrant>,
}

/// Credential Offer as described here:
/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-credential-offer-parameters
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Eq, PartialEq, Clone)]
pub struct CredentialOffer {
    pub credential_issuer: Url,
    pub credential_configuration_ids: Vec<String>,
    pub grants: Option<Grants>,
}

impl CredentialOffer {
    /// An offer is usable when it references at least one configuration and
    /// carries at least one decodable grant.
    pub fn validate(&self) -> Result<(), Oid4vciError> {
        let mut reasons = Vec::new();
        if self.credential_configuration_ids.is_empty() {
            reasons.push("credential_configuration_ids must not be empty".to_string());
        }
        match &self.grants {
            None => reasons.push("grants is missing".to_string()),
            Some(grants)
                if grants.authorization_code.is_none() && grants.pre_authorized_code.is_none() =>
            {
                reasons.push(
                    "grants carries neither authorization_code nor pre-authorized_code".to_string(),
                );
            }
            Some(_) => {}
        }
        if reasons.is_empty() {
            Ok(())
        } else {
            Err(Oid4vciError::OfferMalformed { reasons })
        }
    }
}

/// Either of the two query forms a credential-offer URI may take.
#[derive(Deserialize, Serialize, Debug, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialOfferQuery {
    CredentialOfferUri(Url),
    CredentialOffer(CredentialOffer),
}

impl std::str::FromStr for CredentialOfferQuery {
    type Err = Oid4vciError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url: Url = s.parse().map_err(|e: url::ParseError| Oid4vciError::OfferMalformed {
            reasons: vec![format!("not a valid URI: {e}")],
        })?;
        let map: Map<String, Value> = url
            .query_pairs()
            .map(|(key, value)| {
                let value = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value.into_owned()));
                (key.into_owned(), value)
            })
            .collect();
        serde_json::from_value(Value::Object(map)).map_err(|e| Oid4vciError::OfferMalformed {
            reasons: vec![e.to_string()],
        })
    }
}

impl std::fmt::Display for CredentialOfferQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialOfferQuery::CredentialOfferUri(url) => {
                let mut offer_url = Url::parse("openid-credential-offer://").map_err(|_| std::fmt::Error)?;
                offer_url
                    .query_pairs_mut()
                    .append_pair("credential_offer_uri", url.as_str());
                write!(f, "{}", offer_url)
            }
            CredentialOfferQuery::CredentialOffer(offer) => {
                let mut offer_url = Url::parse("openid-credential-offer://").map_err(|_| std::fmt::Error)?;
                offer_url
                    .query_pairs_mut()
                    .append_pair("credential_offer", &to_query_value(offer).map_err(|_| std::fmt::Error)?);
                write!(f, "{}", offer_url)
            }
        }
    }
}
