use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;

use crate::dispatcher::BackupTransport;
use crate::errors::AppError;

/// Posts lead documents to a spreadsheet ingestion webhook
/// (e.g. a Google Apps Script web app).
#[derive(Clone)]
pub struct WebhookBackupClient {
    client: Client,
    url: String,
    secret: Option<String>,
}

impl WebhookBackupClient {
    pub fn new(url: String, secret: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create backup client: {}", e)))?;

        Ok(Self {
            client,
            url,
            secret,
        })
    }

    /// Target URL with the shared secret appended as `?secret=`.
    fn target_url(&self) -> Result<Url, AppError> {
        // Build URL with proper parameter encoding
        let url = match &self.secret {
            Some(secret) => Url::parse_with_params(&self.url, &[("secret", secret.as_str())]),
            None => Url::parse(&self.url),
        };
        url.map_err(|e| AppError::Backup(format!("Failed to build backup URL: {}", e)))
    }

    pub async fn post_document(&self, document: &Value) -> Result<(), AppError> {
        let url = self.target_url()?;
        // Redact secret from logs
        tracing::debug!("Mirroring lead to backup webhook: {}", self.url);

        let response = self
            .client
            .post(url)
            .json(document)
            .send()
            .await
            .map_err(|e| AppError::Backup(format!("Backup webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Backup(format!(
                "Backup webhook returned status {}",
                status
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl BackupTransport for WebhookBackupClient {
    async fn mirror(&self, document: &Value) -> Result<(), AppError> {
        self.post_document(document).await
    }
}
