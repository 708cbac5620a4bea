use crate::errors::AppError;
use crate::field_mapper::UpstreamForm;
use crate::models::Endpoint;
use crate::normalizer;
use reqwest::{header::CONTENT_TYPE, redirect::Policy};
use std::time::Duration;

pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_REDIRECTS: usize = 3;

/// Raw successful YGL response, before normalization.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub content_type: Option<String>,
    pub body: String,
}

/// Client for the YGL form API.
///
/// Every call is a single POST; failures are reported immediately without retry.
#[derive(Clone)]
pub struct YglClient {
    client: reqwest::Client,
    base_url: String,
}

impl YglClient {
    /// Creates a new `YglClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the YGL API, without a trailing slash.
    pub fn new(base_url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create YGL client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.upstream_path())
    }

    /// Posts `form` to the YGL URL for `endpoint`.
    ///
    /// # Returns
    ///
    /// * `Result<UpstreamResponse, AppError>` - The 2xx response, or `AppError::Upstream`
    ///   carrying YGL's status (or none on timeout / connection failure).
    pub async fn post_form(
        &self,
        endpoint: Endpoint,
        form: &UpstreamForm,
    ) -> Result<UpstreamResponse, AppError> {
        let url = self.url_for(endpoint);
        // The form holds the API key, so only the field count is logged.
        tracing::info!("POST {} ({} form fields)", url, form.len());

        let response = self.client.post(&url).form(form.pairs()).send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("YGL returned {} for {}", status, endpoint.path());
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                message: format!("YGL returned status {}", status),
                details: Some(normalizer::normalize(content_type.as_deref(), &body)),
            });
        }

        tracing::debug!("YGL responded {} with {} bytes", status, body.len());
        Ok(UpstreamResponse {
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = YglClient::new("https://example.com/api".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_for_endpoint() {
        let client = YglClient::new("https://example.com/api".to_string()).unwrap();
        assert_eq!(
            client.url_for(Endpoint::RentalSearch),
            "https://example.com/api/rentals/search.php"
        );
        assert_eq!(
            client.url_for(Endpoint::LeadCreate),
            "https://example.com/api/leads/create.php"
        );
    }
}
