//! Fakes shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use tradein_lead_api::config::{Config, PayloadFormat};
use tradein_lead_api::dispatcher::{BackupTransport, EmailTransport};
use tradein_lead_api::errors::AppError;
use tradein_lead_api::handlers::AppState;
use tradein_lead_api::models::OutboundEmail;
use tradein_lead_api::pipeline::LeadPipeline;

/// Helper function to create test config
pub fn test_config() -> Config {
    Config {
        port: 3000,
        email_api_key: "re_test".to_string(),
        email_api_base_url: "https://api.resend.com".to_string(),
        lead_from: "leads@dealer.example".to_string(),
        lead_recipients: vec![
            "sales@dealer.example".to_string(),
            "crm@dealer.example".to_string(),
        ],
        payload_format: PayloadFormat::Both,
        subject_label: "Trade-In Appraisal Lead".to_string(),
        vendor_name: "Example Motors".to_string(),
        provider_name: "Trade-In Appraisal Form".to_string(),
        phone_country_code: "+1".to_string(),
        backup_webhook_url: None,
        backup_webhook_secret: None,
        honeypot_field: "company".to_string(),
        http_timeout_secs: 5,
        max_body_bytes: 64 * 1024,
        rate_limit_per_second: 5,
        rate_limit_burst: 10,
    }
}

#[derive(Default)]
pub struct FakeEmail {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub fail: bool,
}

impl FakeEmail {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for FakeEmail {
    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>, AppError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(AppError::Delivery("Email API returned 500".into()));
        }
        Ok(Some("msg_123".to_string()))
    }
}

#[derive(Default)]
pub struct FakeBackup {
    pub documents: Mutex<Vec<Value>>,
    pub fail: bool,
}

impl FakeBackup {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn documents(&self) -> Vec<Value> {
        self.documents.lock().unwrap().clone()
    }
}

#[async_trait]
impl BackupTransport for FakeBackup {
    async fn mirror(&self, document: &Value) -> Result<(), AppError> {
        self.documents.lock().unwrap().push(document.clone());
        if self.fail {
            return Err(AppError::Backup("Backup webhook returned status 500".into()));
        }
        Ok(())
    }
}

pub fn pipeline(
    config: &Config,
    email: Arc<FakeEmail>,
    backup: Option<Arc<FakeBackup>>,
) -> LeadPipeline {
    LeadPipeline::from_config(
        config,
        email,
        backup.map(|b| b as Arc<dyn BackupTransport>),
    )
}

pub fn app_state(
    email: Arc<FakeEmail>,
    backup: Option<Arc<FakeBackup>>,
) -> Arc<AppState> {
    let config = test_config();
    let pipeline = pipeline(&config, email, backup);
    Arc::new(AppState { config, pipeline })
}
