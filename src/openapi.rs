use axum::Json;
use utoipa::OpenApi;

use crate::models::LeadAccepted;

/// OpenAPI description of the intake endpoints.
#[derive(OpenApi)]
#[openapi(
    info(title = "Trade-In Lead API", description = "Trade-in appraisal lead intake"),
    paths(
        crate::handlers::health,
        crate::handlers::submit_lead,
        crate::handlers::submit_lead_form
    ),
    components(schemas(LeadAccepted)),
    tags(
        (name = "leads", description = "Lead submission"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document as JSON.
pub async fn serve_openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
