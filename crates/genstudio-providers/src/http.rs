use crate::error::ProviderError;
use serde_json::Value;
use std::time::Duration;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a non-2xx response into `ProviderError::Api`.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message: format!(
            "HTTP {}: {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            body.trim()
        ),
    })
}

pub(crate) async fn read_json(response: reqwest::Response) -> Result<Value, ProviderError> {
    let response = ensure_success(response).await?;
    response
        .json::<Value>()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Check that a client-supplied job id is a single opaque path segment before it is placed in
/// an upstream URL.
pub(crate) fn job_id_segment(job_id: &str) -> Result<&str, ProviderError> {
    let valid = !job_id.is_empty()
        && job_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid {
        Ok(job_id)
    } else {
        Err(ProviderError::InvalidRequest(format!("Invalid job id: {}", job_id)))
    }
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_ids_must_be_one_segment() {
        assert_eq!(job_id_segment("ufawqhfynnddngldkgtslldrkq").unwrap(), "ufawqhfynnddngldkgtslldrkq");
        assert!(job_id_segment("17f20503-6c24-4c16-946b-35dbbce2af2f").is_ok());
        assert!(job_id_segment("pred_1").is_ok());

        for bad in ["", "../account", "a/b", "a%2Fb", "a?b=c", "a b", "..", "id#frag"] {
            assert!(
                matches!(job_id_segment(bad), Err(ProviderError::InvalidRequest(_))),
                "accepted {:?}",
                bad
            );
        }
    }
}
