use getset::Getters;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{crypto, Sign};

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token is not a compact JWS")]
    Malformed,
    #[error("failed to decode JWS part: {0}")]
    Decode(String),
    #[error("JSON (de)serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("signature verification failed: {0}")]
    Verification(#[source] jsonwebtoken::errors::Error),
    #[error("signing failed: {0}")]
    Signer(#[from] anyhow::Error),
}

#[derive(Debug, Serialize, Getters)]
pub struct JsonWebToken<C>
where
    C: Serialize,
{
    #[getset(get = "pub")]
    pub header: Header,
    pub payload: C,
}

impl<C> JsonWebToken<C>
where
    C: Serialize,
{
    pub fn new(header: Header, payload: C) -> Self {
        JsonWebToken { header, payload }
    }
}

/// Assemble and sign a compact JWS. The signature is produced by the
/// [`Sign`] implementor so the private key never has to leave its provider.
pub async fn encode<C, S>(signer: &S, header: Header, claims: C) -> Result<String, JwtError>
where
    C: Serialize,
    S: Sign + ?Sized,
{
    let jwt = JsonWebToken::new(header, claims);
    let message = [base64url_json(&jwt.header)?, base64url_json(&jwt.payload)?].join(".");
    let signature = crypto::base64url_encode(signer.sign(&message).await?);
    Ok([message, signature].join("."))
}

/// Split a compact JWS into its three non-empty parts.
pub fn split(jwt: &str) -> Result<(&str, &str, &str), JwtError> {
    let mut parts = jwt.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(JwtError::Malformed),
    }
}

pub fn decode_header(jwt: &str) -> Result<Header, JwtError> {
    jsonwebtoken::decode_header(jwt).map_err(|e| JwtError::Decode(e.to_string()))
}

/// Deserialize the payload without verifying the signature. Callers must
/// only act on the result after one of the verification paths has passed.
pub fn claims_unverified<T: DeserializeOwned>(jwt: &str) -> Result<T, JwtError> {
    let (_, payload, _) = split(jwt)?;
    let bytes = crypto::base64url_decode(payload).map_err(|e| JwtError::Decode(e.to_string()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Verify the signature with the given key and algorithm and deserialize the
/// payload. Claim semantics (`exp`, `aud`, ...) are left to the caller.
pub fn verify<T: DeserializeOwned>(
    jwt: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
) -> Result<T, JwtError> {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    Ok(jsonwebtoken::decode::<T>(jwt, key, &validation)
        .map_err(JwtError::Verification)?
        .claims)
}

fn base64url_json<T>(value: &T) -> Result<String, JwtError>
where
    T: ?Sized + Serialize,
{
    Ok(crypto::base64url_encode(serde_json::to_vec(value)?))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use p256::ecdsa::signature::Signer;
    use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
    use serde_json::{json, Value};

    use super::*;

    struct TestSigner {
        key: SigningKey,
    }

    #[async_trait]
    impl Sign for TestSigner {
        fn algorithm(&self) -> Algorithm {
            Algorithm::ES256
        }

        fn key_id(&self) -> Option<String> {
            Some("test-key".to_string())
        }

        fn public_jwk(&self) -> Option<Value> {
            None
        }

        async fn sign(&self, message: &str) -> Result<Vec<u8>> {
            let signature: Signature = self.key.sign(message.as_bytes());
            Ok(signature.to_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_encode_verify_round_trip() {
        let signer = TestSigner {
            key: SigningKey::random(&mut rand::rngs::OsRng),
        };
        let claims = json!({
            "iss": "https://wallet.example.org",
            "aud": "https://issuer.example.org",
            "iat": 1593436422,
            "nonce": "nonce",
        });
        let jwt = encode(&signer, Header::new(Algorithm::ES256), claims.clone())
            .await
            .unwrap();

        let verifying_key = VerifyingKey::from(&signer.key);
        let point = verifying_key.to_encoded_point(false);
        let decoded: Value =
            verify(&jwt, &DecodingKey::from_ec_der(point.as_bytes()), Algorithm::ES256).unwrap();
        assert_eq!(decoded, claims);

        let header = decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::ES256);
    }

    #[tokio::test]
    async fn test_tampered_payload_fails_verification() {
        let signer = TestSigner {
            key: SigningKey::random(&mut rand::rngs::OsRng),
        };
        let jwt = encode(&signer, Header::new(Algorithm::ES256), json!({"nonce": "a"}))
            .await
            .unwrap();
        let (header, _, signature) = split(&jwt).unwrap();
        let forged = [header, &crypto::base64url_encode(br#"{"nonce":"b"}"#), signature].join(".");

        let verifying_key = VerifyingKey::from(&signer.key);
        let point = verifying_key.to_encoded_point(false);
        let result: Result<Value, _> =
            verify(&forged, &DecodingKey::from_ec_der(point.as_bytes()), Algorithm::ES256);
        assert!(matches!(result, Err(JwtError::Verification(_))));
    }

    #[test]
    fn test_split_rejects_malformed() {
        assert!(matches!(split("a.b"), Err(JwtError::Malformed)));
        assert!(matches!(split("a.b.c.d"), Err(JwtError::Malformed)));
        assert!(matches!(split("..sig"), Err(JwtError::Malformed)));
        assert!(split("a.b.c").is_ok());
    }
}
