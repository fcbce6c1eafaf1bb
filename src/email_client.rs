use async_trait::async_trait;
use reqwest;
use serde::Deserialize;
use std::time::Duration;
use tracing;

use crate::dispatcher::EmailTransport;
use crate::errors::AppError;
use crate::models::OutboundEmail;

/// Client for a Resend-compatible transactional email API.
#[derive(Clone)]
pub struct EmailApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

impl EmailApiClient {
    /// Creates a new `EmailApiClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the email API, without trailing slash.
    /// * `api_key` - Bearer API key.
    /// * `timeout` - Per-request timeout.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create email client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Sends an email through `POST {base_url}/emails`.
    ///
    /// # Returns
    ///
    /// * `Result<Option<String>, AppError>` - The provider message id, when returned.
    pub async fn send_email(&self, email: &OutboundEmail) -> Result<Option<String>, AppError> {
        let url = format!("{}/emails", self.base_url);
        tracing::info!(
            "Sending lead email to {} recipient(s): {}",
            email.to.len(),
            url
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(email)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Email API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Delivery(format!(
                "Email API returned {}: {}",
                status, error_text
            )));
        }

        // The message has been accepted at this point; an odd body is not a failure
        let id = match response.json::<SendEmailResponse>().await {
            Ok(body) => body.id,
            Err(e) => {
                tracing::warn!("Unexpected email API response body: {}", e);
                None
            }
        };

        Ok(id)
    }
}

#[async_trait]
impl EmailTransport for EmailApiClient {
    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>, AppError> {
        self.send_email(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = EmailApiClient::new(
            "https://api.resend.com/".to_string(),
            "re_test".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.resend.com");
    }
}
