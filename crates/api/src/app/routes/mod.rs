use std::str::FromStr;

use axum::Router;

use invoicer_core::DomainError;

use crate::app::errors;

pub mod clients;
pub mod invoices;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/clients", clients::router())
        .nest("/invoices", invoices::router())
}

/// Parse a path id, answering `400 invalid_id` when it is not one.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}
