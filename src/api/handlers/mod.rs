pub mod auth;
pub mod dashboard;
pub mod health;
pub mod purchase_orders;
pub mod records;
pub mod reports;
pub mod sales;
pub mod users;

use super::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    response::Json,
};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Unwrap a JSON body, turning axum's rejection into a JSON 400.
pub(crate) fn json_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {rejection}");
        ApiError::bad_request(rejection.body_text())
    })
}

/// Same as [`json_payload`] for query strings.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(value)| value).map_err(|rejection| {
        debug!("Rejected query string: {rejection}");
        ApiError::bad_request(rejection.body_text())
    })
}

/// Fallback for unknown routes when no frontend bundle is served.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
