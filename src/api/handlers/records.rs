//! Catalog passthroughs: list, fetch, create, update and delete rows of the
//! plain tables. Every call forwards the caller's token, so what a caller may
//! read or change is decided by the hosted row-level security policies.

use super::json_payload;
use crate::{
    api::{error::ApiError, session::require_auth},
    backend::{Backend, Query},
    domain::{Editable, Record},
};
use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use uuid::Uuid;

pub(crate) fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id.trim()).map_err(|_| ApiError::bad_request("Invalid id"))
}

fn by_id<R: Record>(id: Uuid) -> Query {
    Query::table(R::TABLE).select("*").eq("id", id)
}

pub(crate) async fn list<R: Record>(
    headers: &HeaderMap,
    backend: &Backend,
) -> Result<Json<Vec<R>>, ApiError> {
    let principal = require_auth(headers, backend).await?;
    let (column, ascending) = R::ORDER_BY;
    let query = Query::table(R::TABLE).select("*").order(column, ascending);
    Ok(Json(backend.select(principal.credential(), &query).await?))
}

pub(crate) async fn fetch<R: Record>(
    headers: &HeaderMap,
    backend: &Backend,
    id: &str,
) -> Result<Json<R>, ApiError> {
    let principal = require_auth(headers, backend).await?;
    let id = parse_id(id)?;
    backend
        .select_one(principal.credential(), &by_id::<R>(id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

pub(crate) async fn create<R: Editable>(
    headers: &HeaderMap,
    backend: &Backend,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<(StatusCode, Json<R>), ApiError> {
    let principal = require_auth(headers, backend).await?;
    let input = json_payload(payload)?;
    let row = backend
        .insert(principal.credential(), R::TABLE, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub(crate) async fn update<R: Editable>(
    headers: &HeaderMap,
    backend: &Backend,
    id: &str,
    payload: Result<Json<R::Input>, JsonRejection>,
) -> Result<Json<R>, ApiError> {
    let principal = require_auth(headers, backend).await?;
    let id = parse_id(id)?;
    let input = json_payload(payload)?;
    let rows: Vec<R> = backend
        .update(principal.credential(), &by_id::<R>(id), &input)
        .await?;
    rows.into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

pub(crate) async fn remove<R: Record>(
    headers: &HeaderMap,
    backend: &Backend,
    id: &str,
) -> Result<StatusCode, ApiError> {
    let principal = require_auth(headers, backend).await?;
    let id = parse_id(id)?;
    let query = Query::table(R::TABLE).eq("id", id);
    match backend.delete(principal.credential(), &query).await? {
        0 => Err(ApiError::not_found("Record not found")),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

/// Documented handlers for one table, delegating to the generic functions above.
macro_rules! record_endpoints {
    ($module:ident, $record:ident, $input:ident, $collection:literal, $item:literal, $tag:literal) => {
        pub mod $module {
            use crate::{
                api::error::{ApiError, ErrorBody},
                backend::Backend,
                domain::{$input, $record},
            };
            use axum::{
                extract::{rejection::JsonRejection, Extension, Path},
                http::{HeaderMap, StatusCode},
                response::Json,
            };

            #[utoipa::path(
                get,
                path = $collection,
                responses(
                    (status = 200, description = "All rows visible to the caller", body = [$record]),
                    (status = 401, description = "Missing or invalid session", body = ErrorBody)
                ),
                tag = $tag
            )]
            pub async fn list(
                headers: HeaderMap,
                backend: Extension<Backend>,
            ) -> Result<Json<Vec<$record>>, ApiError> {
                super::list::<$record>(&headers, &backend).await
            }

            #[utoipa::path(
                post,
                path = $collection,
                request_body = $input,
                responses(
                    (status = 201, description = "Row created", body = $record),
                    (status = 400, description = "Malformed body or rejected by the backend", body = ErrorBody),
                    (status = 401, description = "Missing or invalid session", body = ErrorBody)
                ),
                tag = $tag
            )]
            pub async fn create(
                headers: HeaderMap,
                backend: Extension<Backend>,
                payload: Result<Json<$input>, JsonRejection>,
            ) -> Result<(StatusCode, Json<$record>), ApiError> {
                super::create::<$record>(&headers, &backend, payload).await
            }

            #[utoipa::path(
                get,
                path = $item,
                params(("id" = String, Path, description = "Row id")),
                responses(
                    (status = 200, description = "The row", body = $record),
                    (status = 401, description = "Missing or invalid session", body = ErrorBody),
                    (status = 404, description = "No such row", body = ErrorBody)
                ),
                tag = $tag
            )]
            pub async fn fetch(
                Path(id): Path<String>,
                headers: HeaderMap,
                backend: Extension<Backend>,
            ) -> Result<Json<$record>, ApiError> {
                super::fetch::<$record>(&headers, &backend, &id).await
            }

            #[utoipa::path(
                patch,
                path = $item,
                params(("id" = String, Path, description = "Row id")),
                request_body = $input,
                responses(
                    (status = 200, description = "Row updated", body = $record),
                    (status = 400, description = "Malformed body or rejected by the backend", body = ErrorBody),
                    (status = 401, description = "Missing or invalid session", body = ErrorBody),
                    (status = 404, description = "No such row", body = ErrorBody)
                ),
                tag = $tag
            )]
            pub async fn update(
                Path(id): Path<String>,
                headers: HeaderMap,
                backend: Extension<Backend>,
                payload: Result<Json<$input>, JsonRejection>,
            ) -> Result<Json<$record>, ApiError> {
                super::update::<$record>(&headers, &backend, &id, payload).await
            }

            #[utoipa::path(
                delete,
                path = $item,
                params(("id" = String, Path, description = "Row id")),
                responses(
                    (status = 204, description = "Row deleted"),
                    (status = 401, description = "Missing or invalid session", body = ErrorBody),
                    (status = 404, description = "No such row", body = ErrorBody)
                ),
                tag = $tag
            )]
            pub async fn remove(
                Path(id): Path<String>,
                headers: HeaderMap,
                backend: Extension<Backend>,
            ) -> Result<StatusCode, ApiError> {
                super::remove::<$record>(&headers, &backend, &id).await
            }
        }
    };
}

record_endpoints!(products, Product, ProductInput, "/api/products", "/api/products/{id}", "catalog");
record_endpoints!(categories, Category, CategoryInput, "/api/categories", "/api/categories/{id}", "catalog");
record_endpoints!(customers, Customer, CustomerInput, "/api/customers", "/api/customers/{id}", "catalog");
record_endpoints!(suppliers, Supplier, SupplierInput, "/api/suppliers", "/api/suppliers/{id}", "catalog");
