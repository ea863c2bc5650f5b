//! Admin reports: the eight panels as JSON, or the same set as a PDF.

use super::query_params;
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        session::require_admin,
        ServerConfig,
    },
    backend::Backend,
    reports::{self, pdf, ReportRange, ReportSet},
};
use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// First day, `YYYY-MM-DD`. Defaults to 29 days before `to`.
    pub from: Option<NaiveDate>,
    /// Last day, `YYYY-MM-DD`. Defaults to today.
    pub to: Option<NaiveDate>,
}

async fn build(
    headers: &HeaderMap,
    backend: &Backend,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<ReportSet, ApiError> {
    let (principal, _) = require_admin(headers, backend).await?;
    let query = query_params(query)?;
    let range = ReportRange::resolve(query.from, query.to, Utc::now().date_naive())
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    Ok(reports::build(backend, principal.access_token(), range).await)
}

#[utoipa::path(
    get,
    path = "/api/reports",
    params(RangeQuery),
    responses(
        (status = 200, description = "Every panel, failed ones carry an error and a notice", body = ReportSet),
        (status = 400, description = "Start date after end date", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn report(
    headers: HeaderMap,
    backend: Extension<Backend>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Json<ReportSet>, ApiError> {
    Ok(Json(build(&headers, &backend, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/export",
    params(RangeQuery),
    responses(
        (status = 200, description = "Report as a PDF attachment", content_type = "application/pdf"),
        (status = 400, description = "Start date after end date", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "reports"
)]
pub async fn export(
    headers: HeaderMap,
    backend: Extension<Backend>,
    config: Extension<Arc<ServerConfig>>,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let report = build(&headers, &backend, query).await?;

    let bytes = pdf::export(&report, config.currency(), Utc::now()).map_err(|err| {
        error!("Failed to render report PDF: {err}");
        ApiError::internal("Failed to render report")
    })?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        pdf::file_name(&report)
    ))
    .map_err(|err| {
        error!("Failed to build content disposition: {err}");
        ApiError::internal("Failed to render report")
    })?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    response_headers.insert(CONTENT_DISPOSITION, disposition);

    Ok((StatusCode::OK, response_headers, bytes).into_response())
}
