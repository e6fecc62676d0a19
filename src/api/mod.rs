pub mod dto;
pub mod errors;
pub mod handlers;
pub mod views;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::app::Dashboard;
use handlers::ApiDoc;

pub fn router(dashboard: Arc<Dashboard>) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/", get(handlers::index))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/api/sensors", get(handlers::get_sensors))
        .route("/api/relays/{relay}/toggle", post(handlers::toggle_relay))
        .route("/api/log", get(handlers::get_log))
        .route("/health", get(handlers::health))
        .with_state(dashboard)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}
