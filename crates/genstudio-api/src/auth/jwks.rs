//! Clerk session token verification (RS256 via JWKS)
//!
//! Clerk signs session tokens with RS256 and publishes its public keys as a JWKS document.
//! Keys are cached per `kid`; an unknown `kid` triggers a refetch so rotated keys are picked
//! up without a restart.

use super::models::{SessionClaims, UserContext};
use super::TokenVerifier;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genstudio_core::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_CACHE_TTL_SECS: i64 = 3600;
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure (RSA keys only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>,
    #[serde(rename = "e")]
    pub exponent: Option<String>,
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

/// Verifies Clerk session JWTs against the instance's JWKS endpoint.
pub struct ClerkJwtVerifier {
    jwks_url: String,
    issuer: Option<String>,
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
}

impl ClerkJwtVerifier {
    /// # Arguments
    /// * `jwks_url` - e.g. `https://<instance>.clerk.accounts.dev/.well-known/jwks.json`
    /// * `issuer` - expected `iss` claim; not checked when `None`
    pub fn new(jwks_url: String, issuer: Option<String>) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build JWKS client: {}", e)))?;

        Ok(Self {
            jwks_url,
            issuer,
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECS,
        })
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse JWKS: {}", e)))
    }

    fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        if jwk.key_type != "RSA" {
            return Err(AppError::Unauthorized(format!(
                "Unsupported key type: {}",
                jwk.key_type
            )));
        }
        let n = jwk
            .modulus
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing modulus".to_string()))?;
        let e = jwk
            .exponent
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing exponent".to_string()))?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| AppError::Unauthorized(format!("Failed to create RSA key: {}", e)))
    }

    async fn get_decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AppError> {
        let cache_key = kid.unwrap_or("default").to_string();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.key.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;
        let jwk = match kid {
            Some(kid) => jwks
                .keys
                .iter()
                .find(|k| k.key_id.as_deref() == Some(kid))
                .ok_or_else(|| AppError::Unauthorized(format!("Key ID {} not found in JWKS", kid)))?,
            None => jwks
                .keys
                .first()
                .ok_or_else(|| AppError::Unauthorized("No keys found in JWKS".to_string()))?,
        };
        let decoding_key = Self::jwk_to_decoding_key(jwk)?;

        self.cache.write().await.insert(
            cache_key,
            CachedKey {
                key: decoding_key.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds),
            },
        );
        tracing::debug!(kid = ?kid, "Cached Clerk signing key");

        Ok(decoding_key)
    }
}

/// Strict RS256/HS256 validation shared by both verifiers.
pub(crate) fn session_validation(algorithm: Algorithm, issuer: Option<&str>) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.leeway = 5;
    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }
    validation
}

/// Map decode failures to client-facing 401 messages.
pub(crate) fn decode_error(e: jsonwebtoken::errors::Error) -> AppError {
    tracing::debug!(error = %e, "JWT validation failed");
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token has expired".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
            AppError::Unauthorized("Invalid token issuer".to_string())
        }
        jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
            AppError::Unauthorized("Token is not yet valid (nbf)".to_string())
        }
        _ => AppError::Unauthorized("Invalid or expired token".to_string()),
    }
}

pub(crate) fn user_from_claims(claims: SessionClaims) -> Result<UserContext, AppError> {
    if claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized("Token has no subject".to_string()));
    }
    Ok(claims.into())
}

#[async_trait]
impl TokenVerifier for ClerkJwtVerifier {
    async fn verify(&self, token: &str) -> Result<UserContext, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let decoding_key = self.get_decoding_key(header.kid.as_deref()).await?;
        let validation = session_validation(Algorithm::RS256, self.issuer.as_deref());

        let token_data =
            decode::<SessionClaims>(token, &decoding_key, &validation).map_err(decode_error)?;

        user_from_claims(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_rsa_keys_are_rejected() {
        let jwk = Jwk {
            key_type: "EC".to_string(),
            key_id: Some("k1".to_string()),
            algorithm: Some("ES256".to_string()),
            modulus: None,
            exponent: None,
        };
        let err = ClerkJwtVerifier::jwk_to_decoding_key(&jwk).err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_rsa_key_requires_components() {
        let jwk = Jwk {
            key_type: "RSA".to_string(),
            key_id: None,
            algorithm: Some("RS256".to_string()),
            modulus: Some("AQAB".to_string()),
            exponent: None,
        };
        assert!(ClerkJwtVerifier::jwk_to_decoding_key(&jwk).is_err());
    }

    #[tokio::test]
    async fn test_unknown_kid_is_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"keys":[]}"#)
            .create_async()
            .await;

        let verifier = ClerkJwtVerifier::new(
            format!("{}/.well-known/jwks.json", server.url()),
            None,
        )
        .unwrap();
        let err = verifier.get_decoding_key(Some("missing")).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg.contains("missing")));
    }

    #[tokio::test]
    async fn test_non_rs256_token_is_rejected() {
        let verifier =
            ClerkJwtVerifier::new("http://127.0.0.1:9/jwks.json".to_string(), None).unwrap();
        let claims = SessionClaims {
            sub: "user_1".to_string(),
            exp: Utc::now().timestamp() + 60,
            iat: None,
            nbf: None,
            iss: None,
            sid: None,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = verifier.verify(&token).await.err().unwrap();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg.contains("Unsupported algorithm")));
    }
}
