use std::collections::HashMap;

use oid4vc_core::identifier::{CredentialScope, DocType, Locale, Vct};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Credential Issuer Metadata as described here:
/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-credential-issuer-metadata
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialIssuerMetadata {
    pub credential_issuer: Url,
    pub authorization_servers: Option<Vec<Url>>,
    pub credential_endpoint: Url,
    pub credential_configurations_supported: HashMap<String, CredentialConfiguration>,
    pub display: Option<Vec<CredentialDisplay>>,
}

impl CredentialIssuerMetadata {
    pub fn configuration(&self, id: &str) -> Option<&CredentialConfiguration> {
        self.credential_configurations_supported.get(id)
    }

    /// Restrict all configuration display metadata to the given locale.
    pub fn filter_display(&mut self, locale: &Locale) {
        for configuration in self.credential_configurations_supported.values_mut() {
            let display = match configuration {
                CredentialConfiguration::SdJwt(c) => &mut c.display,
                CredentialConfiguration::MsoMdoc(c) => &mut c.display,
            };
            *display = filter_display_for_locale(display, locale);
        }
    }
}

/// One issuable credential, tagged by wire format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "format")]
pub enum CredentialConfiguration {
    #[serde(rename = "vc+sd-jwt")]
    SdJwt(SdJwtConfiguration),
    #[serde(rename = "mso_mdoc")]
    MsoMdoc(MsoMdocConfiguration),
}

impl CredentialConfiguration {
    /// The format string on the wire, i.e. the variant tag.
    pub fn format(&self) -> &'static str {
        match self {
            CredentialConfiguration::SdJwt(_) => "vc+sd-jwt",
            CredentialConfiguration::MsoMdoc(_) => "mso_mdoc",
        }
    }

    pub fn scope(&self) -> Option<&CredentialScope> {
        match self {
            CredentialConfiguration::SdJwt(c) => c.scope.as_ref(),
            CredentialConfiguration::MsoMdoc(c) => c.scope.as_ref(),
        }
    }

    pub fn display(&self) -> &[CredentialDisplay] {
        match self {
            CredentialConfiguration::SdJwt(c) => &c.display,
            CredentialConfiguration::MsoMdoc(c) => &c.display,
        }
    }
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SdJwtConfiguration {
    pub vct: Vct,
    pub scope: Option<CredentialScope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<CredentialDisplay>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MsoMdocConfiguration {
    pub doctype: DocType,
    pub scope: Option<CredentialScope>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<CredentialDisplay>,
}

/// Per-locale display metadata for a credential.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialDisplay {
    pub name: Option<String>,
    pub locale: Option<Locale>,
    pub logo: Option<DisplayLogo>,
    pub description: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
}

#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplayLogo {
    pub url: Url,
    pub alt_text: Option<String>,
}

/// Entries for the requested locale; falling back to `en-US`, then to
/// locale-less entries, when nothing matches.
pub fn filter_display_for_locale(
    display: &[CredentialDisplay],
    locale: &Locale,
) -> Vec<CredentialDisplay> {
    let entries_for = |wanted: &Locale| -> Vec<CredentialDisplay> {
        display
            .iter()
            .filter(|entry| entry.locale.as_ref().is_some_and(|l| wanted.matches(l.as_str())))
            .cloned()
            .collect()
    };

    let matching = entries_for(locale);
    if !matching.is_empty() {
        return matching;
    }
    let fallback = entries_for(&Locale::fallback());
    if !fallback.is_empty() {
        return fallback;
    }
    display.iter().filter(|entry| entry.locale.is_none()).cloned().collect()
}
