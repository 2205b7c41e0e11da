pub mod middleware;
pub mod protocol;
pub mod rest;
pub mod state;

pub use middleware::require_identity;
pub use rest::{dashboard_handler, get_student_handler, submit_lead_handler};

use crate::error::ApiError;
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use rest::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// CORS policy allowing the dashboard front end at `origin`.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, ApiError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN '{}': {}", origin, e)))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(middleware::IDENTITY_EMAIL_HEADER),
            HeaderName::from_static(middleware::IDENTITY_NAME_HEADER),
            HeaderName::from_static(middleware::IDENTITY_AVATAR_HEADER),
        ]))
}

/// Builds the complete application router, including the Swagger UI.
pub fn router(app_state: Arc<AppState>, cors: CorsLayer) -> Router {
    // Public routes (no identity required)
    let public_routes = Router::new().route("/leads", post(submit_lead_handler));

    // Protected routes (identity required)
    let protected_routes = Router::new()
        .route("/api/student", get(get_student_handler))
        .route("/dashboard", get(dashboard_handler))
        .layer(axum_middleware::from_fn(require_identity));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
