//! Field normalization for raw form submissions.
//!
//! Input is untyped and attacker-controlled: every value is coerced to a
//! trimmed string (non-strings become empty), the honeypot is checked before
//! anything else, and the four contact/vehicle identifiers must survive
//! normalization or the lead is rejected.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Lead, LEAD_KEYS};

/// Longest phone number we keep (E.164 maximum).
pub const MAX_PHONE_DIGITS: usize = 15;

/// Raw key carrying the unformatted phone input; wins over `phone`.
pub const RAW_PHONE_KEY: &str = "phoneRaw";

const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "phone", "vin"];

/// Result of normalizing one submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Honeypot was filled in; the caller must answer with a silent success.
    Spam,
    Lead(Lead),
}

#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    honeypot_field: String,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new("company")
    }
}

impl FieldNormalizer {
    pub fn new(honeypot_field: impl Into<String>) -> Self {
        Self {
            honeypot_field: honeypot_field.into(),
        }
    }

    pub fn honeypot_field(&self) -> &str {
        &self.honeypot_field
    }

    /// Normalizes a raw submission into a [`Lead`].
    ///
    /// Returns [`Normalized::Spam`] when the honeypot is set, regardless of
    /// the other fields, and `AppError::Validation` when any of
    /// name/email/phone/vin is empty afterwards.
    pub fn normalize(
        &self,
        raw: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Normalized, AppError> {
        if !text_field(raw, &self.honeypot_field).is_empty() {
            return Ok(Normalized::Spam);
        }

        let raw_phone = text_field(raw, RAW_PHONE_KEY);
        let phone_source = if raw_phone.is_empty() {
            text_field(raw, "phone")
        } else {
            raw_phone
        };

        let extra: BTreeMap<String, String> = raw
            .iter()
            .filter(|(key, _)| self.is_extra_key(key))
            .map(|(key, value)| (key.clone(), coerce(value)))
            .collect();

        let lead = Lead {
            id: Uuid::new_v4(),
            name: text_field(raw, "name"),
            email: text_field(raw, "email"),
            phone: normalize_phone(&phone_source),
            vin: normalize_vin(&text_field(raw, "vin")),
            year: text_field(raw, "year"),
            make: text_field(raw, "make"),
            model: text_field(raw, "model"),
            trim: text_field(raw, "trim"),
            mileage: text_field(raw, "mileage"),
            ext_color: text_field(raw, "extColor"),
            int_color: text_field(raw, "intColor"),
            submitted_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            referrer: text_field(raw, "referrer"),
            landing_page: text_field(raw, "landingPage"),
            extra,
        };

        let missing = missing_required(&lead);
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(Normalized::Lead(lead))
    }

    fn is_extra_key(&self, key: &str) -> bool {
        key != self.honeypot_field && key != RAW_PHONE_KEY && key != "id" && !LEAD_KEYS.contains(&key)
    }
}

/// Required fields that are empty on `lead`, in declaration order.
pub fn missing_required(lead: &Lead) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| lead.get(key).map_or(true, str::is_empty))
        .collect()
}

/// Strips every non-digit and caps the result at [`MAX_PHONE_DIGITS`].
///
/// Extensions are not recognized; their digits count like any other.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_PHONE_DIGITS)
        .collect()
}

pub fn normalize_vin(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn text_field(raw: &Map<String, Value>, key: &str) -> String {
    raw.get(key).map(coerce).unwrap_or_default()
}

fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        _ => String::new(),
    }
}
