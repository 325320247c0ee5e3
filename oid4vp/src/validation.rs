use jsonwebtoken::{Algorithm, DecodingKey};
use oid4vc_core::jwt;
use tracing::debug;
use url::Url;
use x509_parser::prelude::*;

use crate::authorization_request::{ClientIdScheme, RequestObject, RequestObjectClaims};
use crate::error::Oid4vpError;

/// Signature algorithms accepted on request objects.
pub const ALLOWED_ALGORITHMS: [Algorithm; 4] = [
    Algorithm::RS256,
    Algorithm::ES256,
    Algorithm::PS256,
    Algorithm::EdDSA,
];

impl RequestObject {
    /// Verify the JWS signature over `header.payload` using the public key
    /// of the leaf certificate (`x5c[0]`) and the header's `alg`.
    pub fn validate_jwt(&self) -> Result<&Self, Oid4vpError> {
        let algorithm = self.header().alg;
        if !ALLOWED_ALGORITHMS.contains(&algorithm) {
            return Err(Oid4vpError::UnsupportedAlgorithm(algorithm));
        }
        let chain = self.certificate_chain_der()?;
        let leaf = parse_certificate(&chain[0])?;
        let key = decoding_key(&leaf, algorithm)?;
        jwt::verify::<RequestObjectClaims>(self.jws(), &key, algorithm).map_err(|e| {
            debug!("request object signature rejected: {e}");
            Oid4vpError::InvalidSignature
        })?;
        Ok(self)
    }

    /// Check the internal consistency of the `x5c` chain (leaf first): every
    /// validity window covers now, every adjacent pair chains by name, and
    /// every child verifies under its parent's key. A single-element chain
    /// is accepted only when the certificate is self-signed. Anchoring the
    /// root in a trust store is the embedder's policy, not enforced here.
    pub fn validate_trust_chain(&self) -> Result<&Self, Oid4vpError> {
        let chain_der = self.certificate_chain_der()?;
        let chain = chain_der
            .iter()
            .map(|der| parse_certificate(der))
            .collect::<Result<Vec<_>, _>>()?;

        for certificate in &chain {
            if !certificate.validity().is_valid() {
                return Err(Oid4vpError::TrustChainInvalid(format!(
                    "certificate {} is outside its validity window",
                    certificate.subject()
                )));
            }
        }

        if let [certificate] = chain.as_slice() {
            let self_signed = certificate.subject().as_raw() == certificate.issuer().as_raw()
                && certificate.verify_signature(None).is_ok();
            if !self_signed {
                return Err(Oid4vpError::TrustChainInvalid("single non-self-signed".to_string()));
            }
            return Ok(self);
        }

        for (child, parent) in chain.iter().zip(chain.iter().skip(1)) {
            if child.issuer().as_raw() != parent.subject().as_raw() {
                return Err(Oid4vpError::TrustChainInvalid(format!(
                    "issuer of {} does not match the subject of its parent",
                    child.subject()
                )));
            }
            child.verify_signature(Some(parent.public_key())).map_err(|_| {
                Oid4vpError::TrustChainInvalid(format!(
                    "certificate {} does not verify under its parent",
                    child.subject()
                ))
            })?;
        }
        Ok(self)
    }

    /// Check that `client_id` is bound to the leaf certificate through its
    /// Subject Alternative Name extension, per the `client_id_scheme`.
    /// dNSName entries must match exactly (wildcards are not honored); URI
    /// entries are compared after URL normalization.
    pub fn validate_san_name(&self) -> Result<&Self, Oid4vpError> {
        let chain_der = self.certificate_chain_der()?;
        let leaf = parse_certificate(&chain_der[0])?;
        let san = leaf
            .subject_alternative_name()
            .map_err(|e| Oid4vpError::CertificateParse(e.to_string()))?
            .ok_or(Oid4vpError::ClientIdBindingMismatch)?;

        let client_id = self.claims().client_id.as_str();
        let bound = match &self.claims().client_id_scheme {
            ClientIdScheme::X509SanDns => san
                .value
                .general_names
                .iter()
                .any(|name| matches!(name, GeneralName::DNSName(dns) if *dns == client_id)),
            ClientIdScheme::X509SanUri => {
                let client_uri =
                    Url::parse(client_id).map_err(|_| Oid4vpError::ClientIdBindingMismatch)?;
                san.value.general_names.iter().any(|name| {
                    matches!(name, GeneralName::URI(uri)
                        if Url::parse(uri).map(|uri| uri == client_uri).unwrap_or(false))
                })
            }
            ClientIdScheme::Other(scheme) => {
                return Err(Oid4vpError::UnsupportedClientIdScheme(scheme.clone()))
            }
        };
        if bound {
            Ok(self)
        } else {
            Err(Oid4vpError::ClientIdBindingMismatch)
        }
    }

    /// The full acceptance policy: the conjunction of the three checks.
    pub fn authenticate(&self) -> Result<&Self, Oid4vpError> {
        self.validate_jwt()?;
        self.validate_trust_chain()?;
        self.validate_san_name()
    }
}

fn parse_certificate(der: &[u8]) -> Result<X509Certificate<'_>, Oid4vpError> {
    let (_, certificate) =
        X509Certificate::from_der(der).map_err(|e| Oid4vpError::CertificateParse(e.to_string()))?;
    Ok(certificate)
}

fn decoding_key(
    certificate: &X509Certificate<'_>,
    algorithm: Algorithm,
) -> Result<DecodingKey, Oid4vpError> {
    // The bit string inside the SPKI is exactly what jsonwebtoken expects
    // per key type: PKCS#1 for RSA, the uncompressed point for EC, the raw
    // key for Ed25519.
    let spki_bits = certificate.public_key().subject_public_key.data.as_ref();
    match algorithm {
        Algorithm::RS256 | Algorithm::PS256 => Ok(DecodingKey::from_rsa_der(spki_bits)),
        Algorithm::ES256 => Ok(DecodingKey::from_ec_der(spki_bits)),
        Algorithm::EdDSA => Ok(DecodingKey::from_ed_der(spki_bits)),
        other => Err(Oid4vpError::UnsupportedAlgorithm(other)),
    }
}
