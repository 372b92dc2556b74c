//! Shared-secret (HS256) session verifier for local development and tests.

use super::jwks::{decode_error, session_validation, user_from_claims};
use super::models::{SessionClaims, UserContext};
use super::TokenVerifier;
use async_trait::async_trait;
use genstudio_core::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header};

pub struct SharedSecretVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
}

impl SharedSecretVerifier {
    pub fn new(secret: &[u8], issuer: Option<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
        }
    }

    /// Sign a session token for `user_id` valid for `ttl_secs`.
    pub fn issue(&self, user_id: &str, ttl_secs: i64) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: now + ttl_secs,
            iat: Some(now),
            nbf: None,
            iss: self.issuer.clone(),
            sid: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

#[async_trait]
impl TokenVerifier for SharedSecretVerifier {
    async fn verify(&self, token: &str) -> Result<UserContext, AppError> {
        let validation = session_validation(Algorithm::HS256, self.issuer.as_deref());
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(decode_error)?;
        user_from_claims(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_then_verify() {
        let verifier = SharedSecretVerifier::new(b"dev-secret", None);
        let token = verifier.issue("user_2abc", 60).unwrap();
        let user = verifier.verify(&token).await.unwrap();
        assert_eq!(user.user_id, "user_2abc");
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let verifier = SharedSecretVerifier::new(b"dev-secret", None);
        let token = verifier.issue("user_2abc", -120).unwrap();
        let err = verifier.verify(&token).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Token has expired"));
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let issuer = SharedSecretVerifier::new(b"one", None);
        let verifier = SharedSecretVerifier::new(b"two", None);
        let token = issuer.issue("user_2abc", 60).unwrap();
        assert!(verifier.verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn test_issuer_mismatch_rejected() {
        let issuer = SharedSecretVerifier::new(b"s", Some("https://a.example".to_string()));
        let verifier = SharedSecretVerifier::new(b"s", Some("https://b.example".to_string()));
        let token = issuer.issue("user_2abc", 60).unwrap();
        let err = verifier.verify(&token).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == "Invalid token issuer"));
    }
}
