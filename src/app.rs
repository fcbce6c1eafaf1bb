use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::openapi;

/// Builds the HTTP router with CORS, tracing and body limits.
pub fn build_router(state: Arc<AppState>) -> Router {
    with_cross_origin(routes(state))
}

/// Application routes without the outer CORS/tracing layers.
///
/// `main` adds rate limiting here, since it needs the peer address.
pub fn routes(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    let lead_routes = Router::new()
        .route(
            "/api/leads",
            post(handlers::submit_lead)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/leads/form",
            post(handlers::submit_lead_form)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        // Request size limit (prevents memory exhaustion)
        .layer(RequestBodyLimitLayer::new(max_body_bytes));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(openapi::serve_openapi_spec))
        .merge(lead_routes)
        .with_state(state)
}

/// Adds per-client-IP rate limiting.
///
/// Each IP may burst `rate_limit_burst` requests, then gets one more every
/// `rate_limit_period()`. The client IP comes from `X-Forwarded-For`,
/// `X-Real-Ip` or `Forwarded` when present, else from the peer address.
pub fn with_rate_limit(router: Router, config: &Config) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .period(config.rate_limit_period())
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?,
    );

    Ok(router.layer(ServiceBuilder::new().layer(GovernorLayer {
        config: governor_conf,
    })))
}

/// Wraps a router so every response, errors included, carries the CORS headers.
pub fn with_cross_origin(router: Router) -> Router {
    router
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        ))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
