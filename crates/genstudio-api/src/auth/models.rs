use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Claims of a Clerk session token that we rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Clerk user id, e.g. `user_2abc...`
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Session id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// Authenticated caller, stored in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
    pub session_id: Option<String>,
}

impl From<SessionClaims> for UserContext {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub,
            session_id: claims.sid,
        }
    }
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        "Missing user context",
                        "MISSING_USER_CONTEXT",
                    )),
                )
            })
    }
}
