use crate::error::{ClientError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// OrgClaim is the payload of every request token.
/// It asserts an organization and when the assertion stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgClaim {
    /// Organization identifier
    #[serde(rename = "OrgID")]
    pub org_id: i64,

    /// Expiry in seconds since the epoch
    #[serde(rename = "exp")]
    pub exp: i64,
}

impl OrgClaim {
    /// Create a claim for `org_id` that expires `lifetime` from now.
    ///
    /// `exp` is rounded up to the next whole second so it is never at or
    /// before the signing time. Returns `None` if the expiry is not representable.
    pub fn expiring_in(org_id: i64, lifetime: Duration) -> Option<Self> {
        let expires_at = Utc::now().checked_add_signed(lifetime)?;
        let mut exp = expires_at.timestamp();
        if expires_at.timestamp_subsec_nanos() > 0 {
            exp = exp.checked_add(1)?;
        }
        Some(OrgClaim { org_id, exp })
    }
}

/// Signer turns claims into compact HMAC-signed tokens with a pre-shared key.
#[derive(Clone)]
pub struct Signer {
    algorithm: Algorithm,
    key: EncodingKey,
}

impl Signer {
    /// Create a new Signer
    ///
    /// # Arguments
    /// * `algorithm` - HMAC algorithm (HS256, HS384 or HS512)
    /// * `key` - Pre-shared symmetric key, must not be empty
    pub fn new(algorithm: Algorithm, key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Err(ClientError::Config("signing key is empty".to_string()));
        }

        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {}
            other => {
                return Err(ClientError::Config(format!(
                    "unsupported signing algorithm: {:?}",
                    other
                )))
            }
        }

        Ok(Signer {
            algorithm,
            key: EncodingKey::from_secret(key),
        })
    }

    /// Get the configured algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Serialize and sign a claim into a compact token
    pub fn sign(&self, claim: &OrgClaim) -> Result<String> {
        jsonwebtoken::encode(&Header::new(self.algorithm), claim, &self.key)
            .map_err(|e| ClientError::auth(e.to_string(), Some(e)))
    }
}

// Implement Debug manually to avoid exposing the key
impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("algorithm", &self.algorithm)
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_signer_rejects_empty_key() {
        let err = Signer::new(Algorithm::HS256, b"").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_signer_rejects_asymmetric_algorithm() {
        let err = Signer::new(Algorithm::RS256, b"secret").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_token_verifies_with_same_key() {
        let signer = Signer::new(Algorithm::HS256, b"psk").unwrap();
        let claim = OrgClaim::expiring_in(7, Duration::minutes(60)).unwrap();
        let token = signer.sign(&claim).unwrap();

        let decoded = decode::<OrgClaim>(
            &token,
            &DecodingKey::from_secret(b"psk"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(decoded.claims, claim);

        let expected = Utc::now().timestamp() + 3600;
        assert!((decoded.claims.exp - expected).abs() <= 1);
    }

    #[test]
    fn test_short_lifetime_expires_after_now() {
        for _ in 0..200 {
            let signed_at = Utc::now().timestamp();
            let claim = OrgClaim::expiring_in(0, Duration::milliseconds(1)).unwrap();
            assert!(claim.exp > signed_at, "exp {} not after {}", claim.exp, signed_at);
        }
    }

    #[test]
    fn test_unrepresentable_expiry() {
        assert!(OrgClaim::expiring_in(0, Duration::days(365 * 300_000)).is_none());
    }

    #[test]
    fn test_token_rejected_with_other_key() {
        let signer = Signer::new(Algorithm::HS256, b"psk").unwrap();
        let token = signer
            .sign(&OrgClaim::expiring_in(0, Duration::minutes(5)).unwrap())
            .unwrap();

        let result = decode::<OrgClaim>(
            &token,
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_token_payload_field_names() {
        let signer = Signer::new(Algorithm::HS384, b"psk").unwrap();
        assert_eq!(signer.algorithm(), Algorithm::HS384);
        let token = signer
            .sign(&OrgClaim {
                org_id: 42,
                exp: 1_900_000_000,
            })
            .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "HS384");

        let payload: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(payload["OrgID"], 42);
        assert_eq!(payload["exp"], 1_900_000_000i64);
    }

    #[test]
    fn test_signer_debug_redacts_key() {
        let signer = Signer::new(Algorithm::HS256, b"top-secret").unwrap();
        assert!(!format!("{:?}", signer).contains("top-secret"));
    }
}
