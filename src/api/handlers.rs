use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, OpenApi};

use crate::{
    app_state::AppState,
    extractor::{self, Extraction},
    fetcher::{FetchError, RetryError, fetch_with_retry},
    health,
};

pub const MISSING_URL: &str = "Please provide a URL as ?url=yourpage.com";
pub const NO_MAIN_CONTENT: &str = "No main content found.";
pub const FORBIDDEN: &str = "Access forbidden. The website might be blocking automated access.";
pub const PAGE_NOT_FOUND: &str = "Page not found.";

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

#[derive(OpenApi)]
#[openapi(
    paths(convert_page, convert_html, health::health_check),
    components(schemas(health::HealthResponse))
)]
pub struct ApiDoc;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConvertQuery {
    /// Page to fetch and convert.
    pub url: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "convert",
    params(ConvertQuery),
    responses(
        (status = 200, description = "Markdown rendering of the main content", body = String, content_type = "text/markdown"),
        (status = 400, description = "Missing or invalid url"),
        (status = 403, description = "Upstream refused access"),
        (status = 404, description = "Upstream page missing or no main content"),
        (status = 500, description = "Upstream fetch kept failing")
    )
)]
#[instrument(skip_all)]
pub async fn convert_page(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    let Some(url) = query.url.filter(|url| !url.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, MISSING_URL).into_response();
    };
    info!(%url, "converting page");

    let page = match fetch_with_retry(state.source.as_ref(), &url, &state.retry).await {
        Ok(page) => page,
        Err(err) => return fetch_failure(err),
    };

    outcome_response(extractor::extract(&page, &state.markdown))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "convert",
    request_body(content = String, content_type = "text/html", description = "Raw page HTML"),
    responses(
        (status = 200, description = "Markdown rendering of the main content", body = String, content_type = "text/markdown"),
        (status = 404, description = "No main content"),
        (status = 422, description = "Body is not valid UTF-8")
    )
)]
#[instrument(skip_all, fields(size = body.len()))]
pub async fn convert_html(State(state): State<AppState>, body: Bytes) -> Response {
    match extractor::process_bytes(&body, &state.markdown) {
        Ok(outcome) => outcome_response(outcome),
        Err(err) => {
            warn!(%err, "rejecting undecodable body");
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()).into_response()
        }
    }
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn outcome_response(outcome: Extraction) -> Response {
    match outcome {
        Extraction::Rendered(markdown) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE),
                (header::CONTENT_DISPOSITION, "inline"),
            ],
            markdown,
        )
            .into_response(),
        other @ (Extraction::NoMainContent | Extraction::NoRenderableContent) => {
            info!(outcome = ?other, "nothing to render");
            (StatusCode::NOT_FOUND, NO_MAIN_CONTENT).into_response()
        }
    }
}

fn fetch_failure(err: RetryError) -> Response {
    warn!(attempts = err.attempts, error = %err.source, "fetch failed");
    match &err.source {
        FetchError::InvalidUrl(_) | FetchError::UnsupportedScheme(_) => {
            (StatusCode::BAD_REQUEST, err.source.to_string()).into_response()
        }
        source => match source.status() {
            Some(StatusCode::FORBIDDEN) => (StatusCode::FORBIDDEN, FORBIDDEN).into_response(),
            Some(StatusCode::NOT_FOUND) => (StatusCode::NOT_FOUND, PAGE_NOT_FOUND).into_response(),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Failed to fetch the URL after {} attempts. {}",
                    err.attempts, err.source
                ),
            )
                .into_response(),
        },
    }
}
