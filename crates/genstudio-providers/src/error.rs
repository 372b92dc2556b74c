use genstudio_core::{extract_error_message, AppError};
use thiserror::Error;

/// Errors raised while talking to a generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Non-2xx response. `message` reads `HTTP <status>: <reason> - <body>`.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid provider response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Provider configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Upstream HTTP status, when the provider answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Api { message, .. } => AppError::from_provider_message(&message),
            ProviderError::InvalidRequest(message) => AppError::InvalidInput(message),
            ProviderError::Config(message) => AppError::Internal(message),
            other => AppError::Provider {
                status: 500,
                message: extract_error_message(&other.to_string(), "Provider request failed"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genstudio_core::ErrorMetadata;

    #[test]
    fn api_errors_keep_status_class() {
        let err = ProviderError::Api {
            status: 422,
            message: r#"HTTP 422: Unprocessable Entity - {"detail":"bad input"}"#.to_string(),
        };
        assert_eq!(err.upstream_status(), Some(422));
        let app: AppError = err.into();
        assert_eq!(app.http_status_code(), 400);
        assert_eq!(app.client_message(), "Unprocessable Entity");
    }

    #[test]
    fn transport_errors_are_server_class() {
        let app: AppError = ProviderError::Transport("connection refused".to_string()).into();
        assert_eq!(app.http_status_code(), 500);
        assert_eq!(app.client_message(), "Network error: connection refused");
    }

    #[test]
    fn invalid_requests_become_client_errors() {
        let app: AppError = ProviderError::InvalidRequest("ratio is required".to_string()).into();
        assert_eq!(app.http_status_code(), 400);
    }
}
