use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::json;

use crate::signage::state::SharedSnapshot;

/// The display page, polled against `/api/news`.
const SIGNAGE_HTML: &str = include_str!("../../assets/signage.html");

/// Builds the signage HTTP surface over a shared snapshot.
///
/// | Route | Response |
/// |---|---|
/// | `GET /` | display page |
/// | `GET /api/news` | `{updated_at, entries, errors}` |
/// | `GET /healthz` | `{ok: true, updated_at}` |
/// | anything else | 404 `{"error": "not found"}` |
///
/// Every response carries `Cache-Control: no-store`.
pub fn router(snapshot: SharedSnapshot) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/news", get(news))
        .route("/healthz", get(health))
        .fallback(not_found)
        .layer(middleware::map_response(no_store))
        .with_state(snapshot)
}

async fn index() -> Html<&'static str> {
    Html(SIGNAGE_HTML)
}

async fn news(State(snapshot): State<SharedSnapshot>) -> Response {
    let current = snapshot.load();
    Json(&*current).into_response()
}

async fn health(State(snapshot): State<SharedSnapshot>) -> Response {
    let current = snapshot.load();
    Json(json!({ "ok": true, "updated_at": current.updated_at })).into_response()
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

async fn no_store(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
