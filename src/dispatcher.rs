//! Outbound delivery of rendered leads.
//!
//! Failure policy is asymmetric: the primary email transport decides the
//! request outcome, the backup mirror never does.

use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use serde_json::Value;
use std::sync::Arc;

use crate::circuit_breaker::{create_backup_circuit_breaker, BackupBreaker};
use crate::errors::AppError;
use crate::models::OutboundEmail;
use crate::renderer::RenderedLead;

/// Primary transport: a transactional email provider.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Sends one email and returns the provider's message id, if any.
    async fn send(&self, email: &OutboundEmail) -> Result<Option<String>, AppError>;
}

/// Secondary transport: a best-effort mirror such as a spreadsheet webhook.
#[async_trait]
pub trait BackupTransport: Send + Sync {
    async fn mirror(&self, document: &Value) -> Result<(), AppError>;
}

/// What happened to the backup mirror for one lead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    NotConfigured,
    Mirrored,
    /// The circuit breaker is open; the webhook was not called.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub message_id: Option<String>,
    pub backup: BackupOutcome,
}

/// Sends rendered leads to the configured recipients.
///
/// Transports, sender and recipients are injected; nothing is read from the
/// process environment here.
pub struct Dispatcher {
    email: Arc<dyn EmailTransport>,
    backup: Option<Arc<dyn BackupTransport>>,
    breaker: BackupBreaker,
    from: String,
    recipients: Vec<String>,
}

impl Dispatcher {
    pub fn new(
        email: Arc<dyn EmailTransport>,
        backup: Option<Arc<dyn BackupTransport>>,
        from: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            email,
            backup,
            breaker: create_backup_circuit_breaker(),
            from: from.into(),
            recipients,
        }
    }

    /// Builds the provider email for a rendered lead.
    pub fn compose(&self, rendered: &RenderedLead) -> OutboundEmail {
        OutboundEmail {
            from: self.from.clone(),
            to: self.recipients.clone(),
            subject: rendered.subject.clone(),
            text: rendered.text.clone(),
            html: rendered.html.clone(),
            attachments: rendered.attachments.clone(),
        }
    }

    /// Emails the lead, then mirrors `backup_document` if a backup is configured.
    ///
    /// Email failure is returned as [`AppError::Delivery`] and the backup is
    /// not attempted. Backup failures are logged and reported in the
    /// [`DeliveryReport`], never returned as errors. Nothing is retried.
    pub async fn deliver(
        &self,
        rendered: &RenderedLead,
        backup_document: &Value,
    ) -> Result<DeliveryReport, AppError> {
        let email = self.compose(rendered);

        let message_id = self.email.send(&email).await.map_err(|e| match e {
            AppError::Delivery(_) => e,
            other => AppError::Delivery(other.to_string()),
        })?;

        tracing::info!(
            "✓ Lead email accepted by provider (recipients: {}, id: {})",
            email.to.len(),
            message_id.as_deref().unwrap_or("-")
        );

        let backup = self.mirror(backup_document).await;

        Ok(DeliveryReport { message_id, backup })
    }

    async fn mirror(&self, document: &Value) -> BackupOutcome {
        let Some(backup) = &self.backup else {
            return BackupOutcome::NotConfigured;
        };

        match self.breaker.call(backup.mirror(document)).await {
            Ok(()) => {
                tracing::debug!("✓ Lead mirrored to backup webhook");
                BackupOutcome::Mirrored
            }
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("⚠️  Backup webhook circuit open, skipping mirror");
                BackupOutcome::Skipped
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::warn!("⚠️  Backup mirror failed (ignored): {}", e);
                BackupOutcome::Failed(e.to_string())
            }
        }
    }
}
