use oid4vc_core::identifier::{DocType, KeyId, Vct};
use oid4vc_core::{cbor, crypto, jwt};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::credential_issuer_metadata::CredentialConfiguration;
use crate::error::Oid4vciError;
use crate::proof::Proof;

/// Credential Request as described here:
/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-credential-request
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CredentialRequest {
    pub format: String,
    pub vct: Option<Vct>,
    pub doctype: Option<DocType>,
    pub proof: Option<Proof>,
}

impl CredentialRequest {
    /// The body is shaped by the configuration variant; the format string is
    /// the variant tag, passed through verbatim.
    pub fn for_configuration(configuration: &CredentialConfiguration, proof: Proof) -> Self {
        let (vct, doctype) = match configuration {
            CredentialConfiguration::SdJwt(c) => (Some(c.vct.clone()), None),
            CredentialConfiguration::MsoMdoc(c) => (None, Some(c.doctype.clone())),
        };
        Self {
            format: configuration.format().to_string(),
            vct,
            doctype,
            proof: Some(proof),
        }
    }
}

/// Credential Response as described here:
/// https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0-13.html#name-credential-response
///
/// Carries either an immediate `credential` or a `transaction_id` for
/// deferred issuance.
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CredentialResponse {
    pub credential: Option<String>,
    pub transaction_id: Option<String>,
    pub c_nonce: Option<String>,
    pub c_nonce_expires_in: Option<u64>,
}

impl CredentialResponse {
    /// Decode the response according to the configuration variant. Deferred
    /// issuance is not implemented and surfaces as a typed failure.
    pub fn into_payload(
        self,
        configuration: &CredentialConfiguration,
    ) -> Result<CredentialPayload, Oid4vciError> {
        if let Some(transaction_id) = self.transaction_id {
            return Err(Oid4vciError::DeferredIssuanceNotSupported { transaction_id });
        }
        let credential = self.credential.ok_or(Oid4vciError::DecodeFailed {
            format: "credential",
            reason: "response carries neither credential nor transaction_id".to_string(),
        })?;
        match configuration {
            CredentialConfiguration::SdJwt(c) => {
                SdJwtCredential::parse(c.vct.clone(), &credential).map(CredentialPayload::SdJwt)
            }
            CredentialConfiguration::MsoMdoc(c) => {
                MdocCredential::parse(c.doctype.clone(), &credential).map(CredentialPayload::Mdoc)
            }
        }
    }
}

/// Decoded outcome of a credential request, paired with the id of the holder
/// key the proof of possession was bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedCredential {
    pub key_id: KeyId,
    pub credential: CredentialPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CredentialPayload {
    SdJwt(SdJwtCredential),
    Mdoc(MdocCredential),
}

/// An issued SD-JWT VC in its decomposed form:
/// `<issuer-signed JWT>~<disclosure>~...~[<key-binding JWT>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdJwtCredential {
    pub vct: Vct,
    pub issuer_signed: String,
    pub disclosures: Vec<String>,
    pub key_binding_jwt: Option<String>,
}

impl SdJwtCredential {
    pub fn parse(vct: Vct, encoded: &str) -> Result<Self, Oid4vciError> {
        let decode_failed = |reason: String| Oid4vciError::DecodeFailed {
            format: "vc+sd-jwt",
            reason,
        };

        let mut segments = encoded.split('~');
        let issuer_signed = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| decode_failed("missing issuer-signed JWT".to_string()))?;
        jwt::split(issuer_signed)
            .map_err(|_| decode_failed("issuer-signed part is not a compact JWS".to_string()))?;

        let rest: Vec<&str> = segments.collect();
        // A trailing empty segment means the credential ends in `~` and
        // carries no key-binding JWT.
        let (disclosures, key_binding_jwt) = match rest.split_last() {
            None => (Vec::new(), None),
            Some((last, init)) if last.is_empty() => (init.to_vec(), None),
            Some((last, init)) if last.contains('.') => (init.to_vec(), Some(last.to_string())),
            Some(_) => (rest.to_vec(), None),
        };

        for disclosure in &disclosures {
            if disclosure.is_empty() {
                return Err(decode_failed("empty disclosure segment".to_string()));
            }
            crypto::base64url_decode(disclosure)
                .map_err(|e| decode_failed(format!("disclosure is not base64url: {e}")))?;
        }

        Ok(Self {
            vct,
            issuer_signed: issuer_signed.to_string(),
            disclosures: disclosures.into_iter().map(str::to_string).collect(),
            key_binding_jwt,
        })
    }
}

/// An issued mdoc: the issuer-signed CBOR structure of ISO 18013-5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdocCredential {
    pub doc_type: DocType,
    pub issuer_signed: Vec<u8>,
}

impl MdocCredential {
    pub fn parse(doc_type: DocType, encoded: &str) -> Result<Self, Oid4vciError> {
        let issuer_signed = crypto::base64url_decode(encoded).map_err(|e| Oid4vciError::DecodeFailed {
            format: "mso_mdoc",
            reason: e.to_string(),
        })?;
        cbor::validate_issuer_signed(&issuer_signed).map_err(|e| Oid4vciError::DecodeFailed {
            format: "mso_mdoc",
            reason: e.to_string(),
        })?;
        Ok(Self {
            doc_type,
            issuer_signed,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use ciborium::value::Value;

    use crate::credential_issuer_metadata::{MsoMdocConfiguration, SdJwtConfiguration};

    use super::*;

    fn sd_jwt_configuration() -> CredentialConfiguration {
        CredentialConfiguration::SdJwt(SdJwtConfiguration {
            vct: Vct::new("EU.PID").unwrap(),
            scope: None,
            display: vec![],
        })
    }

    fn mdoc_configuration() -> CredentialConfiguration {
        CredentialConfiguration::MsoMdoc(MsoMdocConfiguration {
            doctype: DocType::new("org.iso.18013.5.1.mDL").unwrap(),
            scope: None,
            display: vec![],
        })
    }

    fn issuer_signed_bytes() -> Vec<u8> {
        let value = Value::Map(vec![
            (Value::Text("nameSpaces".into()), Value::Map(vec![])),
            (
                Value::Text("issuerAuth".into()),
                Value::Array(vec![
                    Value::Bytes(vec![0xa1, 0x01, 0x26]),
                    Value::Map(vec![]),
                    Value::Bytes(vec![0x01]),
                    Value::Bytes(vec![0x02]),
                ]),
            ),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&value, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_sd_jwt_with_disclosures_and_trailing_tilde() {
        let encoded = "eyJh.eyJw.c2ln~WyJzYWx0IiwiYSIsMV0~WyJzYWx0IiwiYiIsMl0~";
        let response = CredentialResponse {
            credential: Some(encoded.to_string()),
            transaction_id: None,
            c_nonce: None,
            c_nonce_expires_in: None,
        };
        let payload = response.into_payload(&sd_jwt_configuration()).unwrap();
        assert_matches!(payload, CredentialPayload::SdJwt(sd_jwt) => {
            assert_eq!(sd_jwt.issuer_signed, "eyJh.eyJw.c2ln");
            assert_eq!(sd_jwt.disclosures.len(), 2);
            assert_eq!(sd_jwt.key_binding_jwt, None);
        });
    }

    #[test]
    fn test_sd_jwt_with_key_binding_jwt() {
        let sd_jwt =
            SdJwtCredential::parse(Vct::new("EU.PID").unwrap(), "eyJh.eyJw.c2ln~WyJzYWx0IiwiYSIsMV0~eyJr.eyJi.a2I")
                .unwrap();
        assert_eq!(sd_jwt.disclosures.len(), 1);
        assert_eq!(sd_jwt.key_binding_jwt.as_deref(), Some("eyJr.eyJi.a2I"));
    }

    #[test]
    fn test_sd_jwt_without_disclosures() {
        let sd_jwt = SdJwtCredential::parse(Vct::new("EU.PID").unwrap(), "eyJh.eyJw.c2ln").unwrap();
        assert!(sd_jwt.disclosures.is_empty());
        assert_eq!(sd_jwt.key_binding_jwt, None);
    }

    #[test]
    fn test_sd_jwt_with_malformed_issuer_signed_part() {
        let error = SdJwtCredential::parse(Vct::new("EU.PID").unwrap(), "not-a-jwt~WyJhIl0~").unwrap_err();
        assert_matches!(error, Oid4vciError::DecodeFailed { format: "vc+sd-jwt", .. });
    }

    #[test]
    fn test_mdoc_decoding() {
        let encoded = crypto::base64url_encode(issuer_signed_bytes());
        let response = CredentialResponse {
            credential: Some(encoded),
            transaction_id: None,
            c_nonce: None,
            c_nonce_expires_in: None,
        };
        let payload = response.into_payload(&mdoc_configuration()).unwrap();
        assert_matches!(payload, CredentialPayload::Mdoc(mdoc) => {
            assert_eq!(mdoc.doc_type.as_str(), "org.iso.18013.5.1.mDL");
            assert_eq!(mdoc.issuer_signed, issuer_signed_bytes());
        });
    }

    #[test]
    fn test_mdoc_with_invalid_cbor_fails() {
        let encoded = crypto::base64url_encode(b"junk");
        let error = MdocCredential::parse(DocType::new("org.iso.18013.5.1.mDL").unwrap(), &encoded).unwrap_err();
        assert_matches!(error, Oid4vciError::DecodeFailed { format: "mso_mdoc", .. });
    }

    #[test]
    fn test_deferred_issuance_surfaces_typed_failure() {
        let response = CredentialResponse {
            credential: None,
            transaction_id: Some("t1".to_string()),
            c_nonce: None,
            c_nonce_expires_in: None,
        };
        let error = response.into_payload(&sd_jwt_configuration()).unwrap_err();
        assert_matches!(
            error,
            Oid4vciError::DeferredIssuanceNotSupported { transaction_id } if transaction_id == "t1"
        );
    }

    #[test]
    fn test_request_shape_follows_configuration_variant() {
        let proof = Proof::Jwt { jwt: "a.b.c".to_string() };
        let request = CredentialRequest::for_configuration(&sd_jwt_configuration(), proof.clone());
        assert_eq!(request.format, "vc+sd-jwt");
        assert!(request.vct.is_some());
        assert!(request.doctype.is_none());

        let request = CredentialRequest::for_configuration(&mdoc_configuration(), proof);
        assert_eq!(request.format, "mso_mdoc");
        assert!(request.vct.is_none());
        assert!(request.doctype.is_some());
    }
}
