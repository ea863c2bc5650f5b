//! Purchase orders. Creation and receipt go through stored procedures so the
//! order, its items and the stock update land in one backend transaction.

use super::{json_payload, query_params, records::parse_id, MessageResponse};
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        session::require_auth,
    },
    backend::{Backend, Query},
    domain::{
        check_lines, NewPurchaseOrder, PurchaseOrder, PurchaseOrderItem, PurchaseOrderLine,
        PurchaseOrderStatus, Record,
    },
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query as QueryParams,
    },
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const ITEMS_TABLE: &str = "purchase_order_items";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    /// Only orders in this status.
    pub status: Option<PurchaseOrderStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedPurchaseOrder {
    pub id: Uuid,
    pub total_amount: Decimal,
}

#[derive(Serialize)]
struct CreateOrderArgs<'a> {
    p_supplier_id: Uuid,
    p_order_date: NaiveDate,
    p_expected_date: Option<NaiveDate>,
    p_notes: Option<&'a str>,
    p_total_amount: Decimal,
    p_items: &'a [PurchaseOrderLine],
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    params(OrderFilter),
    responses(
        (status = 200, description = "Purchase orders, newest first", body = [PurchaseOrder]),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "purchase-orders"
)]
pub async fn list_orders(
    headers: HeaderMap,
    backend: Extension<Backend>,
    filter: Result<QueryParams<OrderFilter>, QueryRejection>,
) -> Result<Json<Vec<PurchaseOrder>>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let filter = query_params(filter)?;
    let (column, ascending) = PurchaseOrder::ORDER_BY;
    let mut query = Query::table(PurchaseOrder::TABLE)
        .select("*")
        .order(column, ascending);
    if let Some(status) = filter.status {
        query = query.eq("status", status.as_str());
    }
    Ok(Json(backend.select(principal.credential(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    request_body = NewPurchaseOrder,
    responses(
        (status = 201, description = "Order created with its computed total", body = CreatedPurchaseOrder),
        (status = 400, description = "No items, bad quantities or rejected by the backend", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "purchase-orders"
)]
pub async fn create_order(
    headers: HeaderMap,
    backend: Extension<Backend>,
    payload: Result<Json<NewPurchaseOrder>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedPurchaseOrder>), ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let order = json_payload(payload)?;
    check_lines(&order.items).map_err(|err| ApiError::bad_request(err.message()))?;

    let total_amount = order
        .total_amount()
        .map_err(|err| ApiError::bad_request(err.message()))?;
    let args = CreateOrderArgs {
        p_supplier_id: order.supplier_id,
        p_order_date: order.order_date.unwrap_or_else(|| Utc::now().date_naive()),
        p_expected_date: order.expected_date,
        p_notes: order.notes.as_deref(),
        p_total_amount: total_amount,
        p_items: &order.items,
    };

    let id: Uuid = backend
        .rpc(principal.credential(), "create_purchase_order", &args)
        .await?;

    info!(order_id = %id, %total_amount, items = order.items.len(), "purchase order created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedPurchaseOrder { id, total_amount }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}",
    params(("id" = String, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Order with its items", body = PurchaseOrderDetail),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 404, description = "No such order", body = ErrorBody)
    ),
    tag = "purchase-orders"
)]
pub async fn get_order(
    Path(id): Path<String>,
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<PurchaseOrderDetail>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let id = parse_id(&id)?;

    let order_query = Query::table(PurchaseOrder::TABLE).select("*").eq("id", id);
    let items_query = Query::table(ITEMS_TABLE)
        .select("*")
        .eq("purchase_order_id", id);

    let (order, items) = tokio::join!(
        backend.select_one::<PurchaseOrder>(principal.credential(), &order_query),
        backend.select::<PurchaseOrderItem>(principal.credential(), &items_query),
    );

    let order = order?.ok_or_else(|| ApiError::not_found("Purchase order not found"))?;
    Ok(Json(PurchaseOrderDetail {
        order,
        items: items?,
    }))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/receive",
    params(("id" = String, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Order received and stock updated", body = MessageResponse),
        (status = 400, description = "Rejected by the backend", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "purchase-orders"
)]
pub async fn receive_order(
    Path(id): Path<String>,
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<MessageResponse>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let id = parse_id(&id)?;

    let _: Option<Value> = backend
        .rpc(
            principal.credential(),
            "receive_purchase_order",
            &json!({ "p_order_id": id }),
        )
        .await?;

    info!(order_id = %id, "purchase order received");

    Ok(MessageResponse::new("Purchase order received"))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/cancel",
    params(("id" = String, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Order cancelled", body = PurchaseOrder),
        (status = 400, description = "Order is not pending", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "purchase-orders"
)]
pub async fn cancel_order(
    Path(id): Path<String>,
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<PurchaseOrder>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let id = parse_id(&id)?;

    // Only pending orders may be cancelled; received stock stays booked.
    let query = Query::table(PurchaseOrder::TABLE)
        .eq("id", id)
        .eq("status", PurchaseOrderStatus::Pending.as_str());
    let rows: Vec<PurchaseOrder> = backend
        .update(
            principal.credential(),
            &query,
            &json!({ "status": PurchaseOrderStatus::Cancelled }),
        )
        .await?;

    rows.into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::bad_request("Only pending purchase orders can be cancelled"))
}
