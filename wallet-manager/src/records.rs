use chrono::{DateTime, Utc};
use getset::Getters;
use oid4vc_core::cbor;
use oid4vc_core::identifier::{CredentialId, CredentialSetId, DocType, KeyId, Vct};
use oid4vci::credential::{CredentialPayload, IssuedCredential};
use oid4vci::credential_issuer_metadata::CredentialDisplay;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record {id} could not be decoded: {reason}")]
    Decode { id: String, reason: String },
    #[error("expires_at must lie in the future at issuance time")]
    ExpiresInPast,
}

/// Lifecycle state of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialState {
    #[default]
    Active,
    Revoked,
    Expired,
}

/// A persisted credential in either format, serialized with the record
/// store's stable JSON keys. The two variants are distinguished by their
/// payload key (`encodedIssuerSigned` vs `mdoc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialRecord {
    SdJwt(SdJwtRecord),
    Mdoc(MdocRecord),
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct SdJwtRecord {
    #[serde(rename = "Id")]
    credential_id: CredentialId,
    #[serde(rename = "encodedIssuerSigned")]
    encoded_issuer_signed: String,
    disclosures: Vec<String>,
    vct: Vct,
    #[serde(rename = "keyId")]
    key_id: KeyId,
    #[serde(rename = "credentialSetId")]
    credential_set_id: CredentialSetId,
    #[serde(rename = "credentialState")]
    state: CredentialState,
    #[serde(rename = "expiresAt")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    displays: Vec<CredentialDisplay>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct MdocRecord {
    #[serde(rename = "Id")]
    credential_id: CredentialId,
    /// Issuer-signed CBOR bytes, base64url in JSON.
    #[serde(with = "b64url_bytes")]
    mdoc: Vec<u8>,
    #[serde(rename = "docType")]
    doc_type: DocType,
    #[serde(rename = "keyId")]
    key_id: KeyId,
    #[serde(rename = "credentialSetId")]
    credential_set_id: CredentialSetId,
    #[serde(rename = "credentialState")]
    state: CredentialState,
    #[serde(rename = "expiresAt")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    displays: Vec<CredentialDisplay>,
}

impl CredentialRecord {
    /// Build a record from a freshly issued credential. The credential id
    /// and set id are generated here and never change afterwards; the state
    /// starts `ACTIVE`.
    pub fn from_issued(
        issued: IssuedCredential,
        displays: Vec<CredentialDisplay>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, RecordError> {
        if expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(RecordError::ExpiresInPast);
        }
        let record = match issued.credential {
            CredentialPayload::SdJwt(sd_jwt) => Self::SdJwt(SdJwtRecord {
                credential_id: CredentialId::random(),
                encoded_issuer_signed: sd_jwt.issuer_signed,
                disclosures: sd_jwt.disclosures,
                vct: sd_jwt.vct,
                key_id: issued.key_id,
                credential_set_id: CredentialSetId::random(),
                state: CredentialState::default(),
                expires_at,
                displays,
            }),
            CredentialPayload::Mdoc(mdoc) => Self::Mdoc(MdocRecord {
                credential_id: CredentialId::random(),
                mdoc: mdoc.issuer_signed,
                doc_type: mdoc.doc_type,
                key_id: issued.key_id,
                credential_set_id: CredentialSetId::random(),
                state: CredentialState::default(),
                expires_at,
                displays,
            }),
        };
        Ok(record)
    }

    pub fn credential_id(&self) -> CredentialId {
        match self {
            CredentialRecord::SdJwt(record) => record.credential_id,
            CredentialRecord::Mdoc(record) => record.credential_id,
        }
    }

    pub fn key_id(&self) -> &KeyId {
        match self {
            CredentialRecord::SdJwt(record) => &record.key_id,
            CredentialRecord::Mdoc(record) => &record.key_id,
        }
    }

    pub fn state(&self) -> CredentialState {
        match self {
            CredentialRecord::SdJwt(record) => record.state,
            CredentialRecord::Mdoc(record) => record.state,
        }
    }

    /// Encoding is total for an in-memory record: only string keys and
    /// JSON-representable values are involved.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("credential record serialization is infallible")
    }

    /// Decode a stored record, revalidating mdoc payload bytes. Failures
    /// name the offending record id.
    pub fn from_json(value: serde_json::Value) -> Result<Self, RecordError> {
        let id = value
            .get("Id")
            .and_then(|id| id.as_str())
            .unwrap_or("<unknown>")
            .to_string();
        let record: Self = serde_json::from_value(value).map_err(|e| RecordError::Decode {
            id: id.clone(),
            reason: e.to_string(),
        })?;
        if let CredentialRecord::Mdoc(mdoc) = &record {
            cbor::validate_issuer_signed(&mdoc.mdoc).map_err(|e| RecordError::Decode {
                id,
                reason: e.to_string(),
            })?;
        }
        Ok(record)
    }
}

mod b64url_bytes {
    use oid4vc_core::crypto;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&crypto::base64url_encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        crypto::base64url_decode(&encoded).map_err(serde::de::Error::custom)
    }
}
