use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Canonical trade-in lead, produced once per request by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Digits only, at most 15 characters.
    pub phone: String,
    /// Upper-cased, otherwise unvalidated.
    pub vin: String,
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub mileage: String,
    pub ext_color: String,
    pub int_color: String,
    /// RFC 3339 UTC timestamp assigned at normalization time.
    pub submitted_at: String,
    pub referrer: String,
    pub landing_page: String,
    /// Free-form form answers (condition, accidents, wear...), keyed as submitted.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Lead {
    /// Looks up a field by its wire key, covering both typed and extra fields.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "name" => &self.name,
            "email" => &self.email,
            "phone" => &self.phone,
            "vin" => &self.vin,
            "year" => &self.year,
            "make" => &self.make,
            "model" => &self.model,
            "trim" => &self.trim,
            "mileage" => &self.mileage,
            "extColor" => &self.ext_color,
            "intColor" => &self.int_color,
            "submittedAt" => &self.submitted_at,
            "referrer" => &self.referrer,
            "landingPage" => &self.landing_page,
            other => return self.extra.get(other).map(String::as_str),
        };
        Some(value.as_str())
    }

    /// All fields as `(wire key, value)` pairs, typed fields first.
    pub fn fields(&self) -> Vec<(&str, &str)> {
        let mut fields: Vec<(&str, &str)> = LEAD_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect();
        fields.extend(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        fields
    }

    /// Short fingerprint used in logs instead of contact details.
    pub fn reference(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.email.to_lowercase().as_bytes());
        hasher.update(b"|");
        hasher.update(self.vin.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..12].to_string()
    }

    /// Flat JSON document sent to the backup mirror.
    ///
    /// Extra fields are merged at the top level; they never overwrite typed fields.
    pub fn to_document(&self, subject: &str) -> Value {
        let mut doc = Map::new();
        for (key, value) in &self.extra {
            doc.insert(key.clone(), json!(value));
        }
        for key in LEAD_KEYS {
            if let Some(value) = self.get(key) {
                doc.insert((*key).to_string(), json!(value));
            }
        }
        doc.insert("id".to_string(), json!(self.id.to_string()));
        doc.insert("subject".to_string(), json!(subject));
        Value::Object(doc)
    }
}

/// Wire keys of the typed lead fields, in canonical order.
pub const LEAD_KEYS: &[&str] = &[
    "name",
    "email",
    "phone",
    "vin",
    "year",
    "make",
    "model",
    "trim",
    "mileage",
    "extColor",
    "intColor",
    "submittedAt",
    "referrer",
    "landingPage",
];

/// Email handed to the primary transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Email attachment with base64-encoded content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
}

/// Success body returned to the browser.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeadAccepted {
    pub ok: bool,
    /// Present only when the submission was silently dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,
}

impl LeadAccepted {
    pub fn delivered() -> Self {
        Self {
            ok: true,
            silent: None,
        }
    }

    pub fn silent() -> Self {
        Self {
            ok: true,
            silent: Some(true),
        }
    }
}
