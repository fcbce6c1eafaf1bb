use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

/// Application-specific error types.
///
/// Spam submissions are not represented here: a triggered honeypot is a
/// successful no-op (see [`crate::pipeline::IntakeOutcome::Suppressed`]).
#[derive(Debug, Clone)]
pub enum AppError {
    /// JSON body could not be parsed.
    MalformedInput(String),
    /// Multipart form body could not be read.
    MalformedForm(String),
    /// Required lead fields are empty after normalization.
    Validation(String),
    /// The primary email transport failed.
    Delivery(String),
    /// The backup mirror failed. Swallowed by the dispatcher, never surfaced.
    Backup(String),
    /// HTTP method other than POST/OPTIONS on an intake route.
    MethodNotAllowed,
    /// Internal server error.
    Internal(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            AppError::MalformedForm(msg) => write!(f, "Malformed form data: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Delivery(msg) => write!(f, "Delivery error: {}", msg),
            AppError::Backup(msg) => write!(f, "Backup error: {}", msg),
            AppError::MethodNotAllowed => write!(f, "Method not allowed"),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Status code and public body for this error.
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MalformedInput(_) => (StatusCode::BAD_REQUEST, "Invalid JSON"),
            AppError::MalformedForm(_) => (StatusCode::BAD_REQUEST, "Invalid form data"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Missing required fields"),
            AppError::Delivery(_) => (StatusCode::BAD_GATEWAY, "Failed to send lead"),
            AppError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
            AppError::Backup(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::WithContext { source, .. } => source.status_and_message(),
        }
    }

    /// The innermost error beneath any context layers.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    /// Converts the error into a plain-text HTTP response.
    ///
    /// Logs errors according to their severity.
    fn into_response(self) -> Response {
        match &self {
            AppError::MalformedInput(msg) | AppError::MalformedForm(msg) => {
                tracing::debug!("Rejected malformed body: {}", msg)
            }
            AppError::Validation(msg) => tracing::info!("Rejected lead: {}", msg),
            AppError::Delivery(msg) => tracing::error!("Lead delivery failed: {}", msg),
            AppError::Backup(msg) => tracing::warn!("Backup error reached response: {}", msg),
            AppError::MethodNotAllowed => {}
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                // Log full context chain, then delegate to the underlying error
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.as_ref().clone().into_response();
            }
        }

        let (status, message) = self.status_and_message();
        (status, message).into_response()
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
