use super::records::parse_id;
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        session::require_auth,
    },
    backend::Backend,
};
use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    /// Counters computed by `get_dashboard_stats`.
    #[schema(value_type = Object)]
    pub stats: Value,
    /// Products at or below their minimum stock level.
    #[schema(value_type = Vec<Object>)]
    pub low_stock: Vec<Value>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Counters and low stock products", body = Dashboard),
        (status = 401, description = "Missing or invalid session", body = ErrorBody)
    ),
    tag = "dashboard"
)]
pub async fn dashboard(
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<Dashboard>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let no_args = json!({});

    let (stats, low_stock) = tokio::join!(
        backend.rpc::<_, Option<Value>>(principal.credential(), "get_dashboard_stats", &no_args),
        backend.rpc::<_, Option<Vec<Value>>>(
            principal.credential(),
            "get_low_stock_products",
            &no_args
        ),
    );

    Ok(Json(Dashboard {
        stats: stats?.unwrap_or_else(|| json!({})),
        low_stock: low_stock?.unwrap_or_default(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/details",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with category, supplier and stock details", body = Object),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "catalog"
)]
pub async fn product_details(
    Path(id): Path<String>,
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<Value>, ApiError> {
    let principal = require_auth(&headers, &backend).await?;
    let id = parse_id(&id)?;

    let details: Option<Value> = backend
        .rpc(
            principal.credential(),
            "get_product_details",
            &json!({ "p_product_id": id }),
        )
        .await?;

    // Table-returning procedures answer with an array, possibly empty.
    let details = match details {
        Some(Value::Array(rows)) => rows.into_iter().next(),
        other => other,
    };
    details
        .filter(|value| !value.is_null())
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::tests::test_backend;
    use anyhow::Result;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(backend: Backend) -> Router {
        Router::new()
            .route("/api/dashboard", get(dashboard))
            .route("/api/products/:id/details", get(product_details))
            .layer(Extension(backend))
    }

    async fn mount_session(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": Uuid::new_v4()})),
            )
            .mount(server)
            .await;
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", "Bearer user-token")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn dashboard_combines_both_procedures() -> Result<()> {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_dashboard_stats"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"total_products": 42, "today_revenue": 310.5})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_low_stock_products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "Zahar 1kg", "stock_quantity": 2, "min_stock_level": 10}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(get_request("/api/dashboard"))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
        assert_eq!(body["stats"]["total_products"], 42);
        assert_eq!(body["low_stock"][0]["name"], "Zahar 1kg");
        Ok(())
    }

    #[tokio::test]
    async fn product_details_passes_product_id() -> Result<()> {
        let server = MockServer::start().await;
        mount_session(&server).await;
        let id = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_product_details"))
            .and(body_json(json!({"p_product_id": id})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": id, "name": "Cafea", "category_name": "Bauturi"}])),
            )
            .mount(&server)
            .await;

        let app = app(test_backend(&server.uri()));
        let response = app
            .clone()
            .oneshot(get_request(&format!("/api/products/{id}/details")))
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
        assert_eq!(body["category_name"], "Bauturi");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() -> Result<()> {
        let server = MockServer::start().await;
        mount_session(&server).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/get_product_details"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(get_request(&format!(
                "/api/products/{}/details",
                Uuid::new_v4()
            )))
            .await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
