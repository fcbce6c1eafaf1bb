//! Trade-In Lead Intake API Library
//!
//! Receives trade-in appraisal form submissions, normalizes them into a
//! canonical lead, renders ADF/XML and HTML payloads, emails them through a
//! transactional email provider and mirrors them to an optional backup webhook.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Lead normalization, rendering and delivery logic.
//! - `integrations`: External service clients.
//! - `app`: Router assembly (CORS, limits, tracing).
//! - `backup_client`: Backup webhook client.
//! - `circuit_breaker`: Circuit breaker for the backup mirror.
//! - `config`: Configuration management.
//! - `dispatcher`: Primary/secondary delivery with asymmetric failure policy.
//! - `email_client`: Transactional email API client.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `normalizer`: Raw field normalization.
//! - `openapi`: OpenAPI document.
//! - `pipeline`: End-to-end lead intake.
//! - `renderer`: ADF/XML, HTML and text payloads.

pub mod api;
pub mod core;
pub mod integrations;

pub mod app;
pub mod backup_client;
pub mod circuit_breaker;
pub mod config;
pub mod dispatcher;
pub mod email_client;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod openapi;
pub mod pipeline;
pub mod renderer;
