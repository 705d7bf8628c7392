pub mod handlers;

use axum::{Router, routing::get};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{app_state::AppState, health::health_check};

pub use handlers::ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::convert_page).post(handlers::convert_html))
        .route("/healthz", get(health_check))
        .route("/api-docs/openapi.json", get(handlers::openapi))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
