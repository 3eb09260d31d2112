use axum::Json;
use axum::http::StatusCode;

use crate::app::errors;

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

pub async fn not_found(uri: axum::http::Uri) -> axum::response::Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("no route for {}", uri.path()))
}
