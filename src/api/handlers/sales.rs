//! Sales history and checkout.

use super::{json_payload, query_params};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        session::require_auth,
    },
    backend::{Backend, Query},
    domain::{check_lines, CartLine, Checkout, PaymentMethod, Record, Sale},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query as QueryParams,
    },
    http::{HeaderMap, StatusCode},
    response::Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesFilter {
    /// Most recent sales to return, 100 by default.
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompletedSale {
    pub id: Uuid,
    pub total_amount: Decimal,
}

#[derive(Serialize)]
struct ProcessSaleArgs<'a> {
    p_customer_id: Option<Uuid>,
    p_payment_method: PaymentMethod,
    p_total_amount: Decimal,
    p_items: &'a [CartLine],
}

#[utoipa::path(
    get,
    path = "/api/sales",
    params(SalesFilter),
    responses(
        (status = 200, description = "Recent sales, newest first", body = [Sale]),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "sales"
)]
pub async fn list_sales(
    headers: HeaderMap,
    backend: Extension<Backend>,
    filter: Result<QueryParams<SalesFilter>, QueryRejection>,
) -> Result<Json<Vec<Sale>>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let filter = query_params(filter)?;
    let (column, ascending) = Sale::ORDER_BY;
    let query = Query::table(Sale::TABLE)
        .select("*")
        .order(column, ascending)
        .limit(filter.limit.unwrap_or(DEFAULT_LIMIT));
    Ok(Json(backend.select(principal.credential(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/api/sales",
    request_body = Checkout,
    responses(
        (status = 201, description = "Sale recorded and stock decremented", body = CompletedSale),
        (status = 400, description = "Empty cart, bad quantities or rejected by the backend", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "sales"
)]
pub async fn checkout(
    headers: HeaderMap,
    backend: Extension<Backend>,
    payload: Result<Json<Checkout>, JsonRejection>,
) -> Result<(StatusCode, Json<CompletedSale>), ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let cart = json_payload(payload)?;
    check_lines(&cart.items).map_err(|err| ApiError::bad_request(err.message()))?;

    let total_amount = cart
        .total_amount()
        .map_err(|err| ApiError::bad_request(err.message()))?;
    let args = ProcessSaleArgs {
        p_customer_id: cart.customer_id,
        p_payment_method: cart.payment_method,
        p_total_amount: total_amount,
        p_items: &cart.items,
    };

    let id: Uuid = backend
        .rpc(principal.credential(), "process_sale", &args)
        .await?;

    info!(sale_id = %id, %total_amount, items = cart.items.len(), "sale processed");

    Ok((StatusCode::CREATED, Json(CompletedSale { id, total_amount })))
}
