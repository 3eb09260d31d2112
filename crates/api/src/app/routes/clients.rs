use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use invoicer_core::ClientId;

use crate::app::routes::parse_id;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/:id", get(get_client).put(update_client).delete(delete_client))
}

pub async fn list_clients(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_clients().await {
        Ok(clients) => (StatusCode::OK, Json(clients)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.client(id).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_client(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::ClientRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_client(draft).await {
        Ok(client) => (StatusCode::CREATED, Json(client)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::ClientRequest>, JsonRejection>,
) -> axum::response::Response {
    let id: ClientId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_client(id, draft).await {
        Ok(client) => (StatusCode::OK, Json(client)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_client(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ClientId = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.delete_client(id).await {
        Ok(()) => {
            let body = dto::MessageResponse { message: "Client deleted" };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
