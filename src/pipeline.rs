use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::dispatcher::{BackupTransport, DeliveryReport, Dispatcher, EmailTransport};
use crate::errors::{AppError, ResultExt};
use crate::normalizer::{FieldNormalizer, Normalized};
use crate::renderer::{self, RenderSettings};

/// Terminal result of a lead submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Email accepted by the provider; backup outcome attached for logging.
    Delivered(DeliveryReport),
    /// Honeypot triggered. Nothing was sent.
    Suppressed,
}

/// validate → normalize → render → deliver, for one submission at a time.
///
/// Stateless across requests; share it behind an `Arc`.
pub struct LeadPipeline {
    normalizer: FieldNormalizer,
    settings: RenderSettings,
    dispatcher: Dispatcher,
}

impl LeadPipeline {
    pub fn new(normalizer: FieldNormalizer, settings: RenderSettings, dispatcher: Dispatcher) -> Self {
        Self {
            normalizer,
            settings,
            dispatcher,
        }
    }

    /// Wires a pipeline from configuration and already-built transports.
    pub fn from_config(
        config: &Config,
        email: Arc<dyn EmailTransport>,
        backup: Option<Arc<dyn BackupTransport>>,
    ) -> Self {
        Self::new(
            FieldNormalizer::new(config.honeypot_field.clone()),
            RenderSettings::from(config),
            Dispatcher::new(
                email,
                backup,
                config.lead_from.clone(),
                config.lead_recipients.clone(),
            ),
        )
    }

    pub async fn process(&self, raw: &Map<String, Value>) -> Result<IntakeOutcome, AppError> {
        self.process_at(raw, Utc::now()).await
    }

    /// Runs the pipeline with an explicit submission timestamp.
    pub async fn process_at(
        &self,
        raw: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<IntakeOutcome, AppError> {
        tracing::debug!("Lead received with {} raw field(s)", raw.len());

        let lead = match self.normalizer.normalize(raw, now)? {
            Normalized::Spam => {
                tracing::info!(
                    "🍯 Honeypot '{}' filled, suppressing submission",
                    self.normalizer.honeypot_field()
                );
                return Ok(IntakeOutcome::Suppressed);
            }
            Normalized::Lead(lead) => lead,
        };

        let reference = lead.reference();
        tracing::info!(
            "📨 Lead {} normalized ({} extra field(s))",
            reference,
            lead.extra.len()
        );

        let rendered = renderer::render(&lead, &self.settings);
        let document = lead.to_document(&rendered.subject);

        let report = self
            .dispatcher
            .deliver(&rendered, &document)
            .await
            .with_context(|| format!("delivering lead {}", reference))?;

        tracing::info!(
            "✅ Lead {} delivered (backup: {:?})",
            reference,
            report.backup
        );
        Ok(IntakeOutcome::Delivered(report))
    }
}
