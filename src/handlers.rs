use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::config::Config;
use crate::errors::AppError;
use crate::models::LeadAccepted;
use crate::pipeline::{IntakeOutcome, LeadPipeline};

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Lead normalization and delivery pipeline.
    pub pipeline: LeadPipeline,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "tradein-lead-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/leads
///
/// Accepts a JSON object of raw form fields, normalizes it and emails the lead.
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "leads",
    responses(
        (status = 200, description = "Lead delivered, or silently dropped as spam", body = LeadAccepted),
        (status = 400, description = "Invalid JSON or missing required fields"),
        (status = 405, description = "Method Not Allowed"),
        (status = 502, description = "Failed to send lead")
    )
)]
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LeadAccepted>, AppError> {
    let raw = parse_json_fields(&body)?;
    Ok(respond(state.pipeline.process(&raw).await?))
}

/// POST /api/leads/form
///
/// Same as [`submit_lead`] for native `multipart/form-data` submissions.
/// File parts are ignored.
#[utoipa::path(
    post,
    path = "/api/leads/form",
    tag = "leads",
    responses(
        (status = 200, description = "Lead delivered, or silently dropped as spam", body = LeadAccepted),
        (status = 400, description = "Invalid form data or missing required fields"),
        (status = 405, description = "Method Not Allowed"),
        (status = 502, description = "Failed to send lead")
    )
)]
pub async fn submit_lead_form(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<LeadAccepted>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::MalformedForm(e.body_text()))?;

    let mut raw = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedForm(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            tracing::debug!("Ignoring file part '{}'", name);
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| AppError::MalformedForm(e.body_text()))?;
        raw.insert(name, Value::String(value));
    }

    Ok(respond(state.pipeline.process(&raw).await?))
}

/// Answers plain `OPTIONS` requests; real CORS preflights are handled by the CORS layer.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Parses a request body into raw lead fields.
///
/// Valid JSON that is not an object yields no fields, so it fails
/// required-field validation rather than parsing.
pub fn parse_json_fields(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(AppError::MalformedInput(e.to_string())),
    }
}

fn respond(outcome: IntakeOutcome) -> Json<LeadAccepted> {
    Json(match outcome {
        IntakeOutcome::Delivered(_) => LeadAccepted::delivered(),
        IntakeOutcome::Suppressed => LeadAccepted::silent(),
    })
}
