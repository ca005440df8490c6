//! JWT token generation and validation
//!
//! HS256 tokens carrying the account's external subject id and handle. The
//! rest of the system treats token validation as the identity-resolution
//! boundary: a handler either gets back a `Claims` or the request is
//! unauthenticated.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::{CoreError, Result};

/// JWT claims for an authenticated account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// External identity subject (account login identifier)
    pub sub: String,
    /// Account handle
    pub handle: String,
    /// Expiry (unix seconds)
    pub exp: u64,
    /// Issued at (unix seconds)
    pub iat: u64,
}

/// Signs and validates bearer tokens
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Generate a token for an account. Returns (token, expires_at).
    pub fn generate_token(&self, subject: &str, handle: &str) -> Result<(String, u64)> {
        let now = Utc::now().timestamp() as u64;
        let expires_at = now + self.expiry_seconds;

        let claims = Claims {
            sub: subject.to_string(),
            handle: handle.to_string(),
            exp: expires_at,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| CoreError::Auth(format!("Failed to sign token: {}", e)))?;

        Ok((token, expires_at))
    }

    /// Validate a token and return its claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| CoreError::Unauthenticated(format!("Invalid token: {}", e)))
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let jwt = JwtValidator::new("test-secret", 3600);
        let (token, expires_at) = jwt.generate_token("alice@example.com", "alice").unwrap();

        let claims = jwt.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.handle, "alice");
        assert_eq!(claims.exp, expires_at);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = JwtValidator::new("secret-a", 3600);
        let verifier = JwtValidator::new("secret-b", 3600);

        let (token, _) = signer.generate_token("alice@example.com", "alice").unwrap();
        let err = verifier.validate(&token).unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Sign a token that expired an hour ago, beyond the default leeway
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            handle: "alice".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret".as_bytes()),
        )
        .unwrap();

        let jwt = JwtValidator::new("test-secret", 3600);
        let err = jwt.validate(&token).unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated(_)));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header(Some("Bearer abc123")), Some("abc123"));
        assert_eq!(extract_token_from_header(Some("Basic abc123")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
