//! Authentication
//!
//! Every `/api/*` route except the OpenAPI document requires `Authorization: Bearer <token>`
//! where the token is a Clerk session JWT. The `sub` claim becomes the caller's user id.

pub mod hs256;
pub mod jwks;
pub mod middleware;
pub mod models;

use async_trait::async_trait;
use genstudio_core::AppError;

pub use hs256::SharedSecretVerifier;
pub use jwks::ClerkJwtVerifier;
pub use models::{SessionClaims, UserContext};

/// Turns a bearer token into the authenticated caller.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserContext, AppError>;
}
