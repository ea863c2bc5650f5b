use crate::{api::handlers::health, backend::Backend};
use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::options,
    Extension, Router,
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    services::{ServeDir, ServeFile},
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

pub mod error;
pub mod handlers;
pub mod session;
// Page gatekeeping in front of the frontend bundle.
mod gate;
mod openapi;

pub use openapi::openapi;

pub const DEFAULT_CURRENCY: &str = "RON";

/// Build the API router with all documented routes registered.
#[must_use]
pub fn router() -> OpenApiRouter {
    openapi::api_router()
}

/// Settings the handlers read at request time, shared as `Extension<Arc<ServerConfig>>`.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    static_dir: Option<PathBuf>,
    secure_cookies: bool,
    currency: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            static_dir: None,
            secure_cookies: false,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    /// Directory holding the built frontend; `index.html` answers unknown paths.
    #[must_use]
    pub fn with_static_dir(mut self, static_dir: Option<String>) -> Self {
        self.static_dir = static_dir
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        self
    }

    #[must_use]
    pub const fn with_secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: String) -> Self {
        if !currency.trim().is_empty() {
            self.currency = currency.trim().to_string();
        }
        self
    }

    #[must_use]
    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }

    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Assemble the full application: documented routes, Swagger UI, the page
/// gate, the frontend fallback and the shared layers.
pub fn app(backend: Backend, config: ServerConfig) -> Router {
    let (router, openapi) = router().split_for_parts();

    let router = router
        .route("/health", options(health::health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    let router = match config.static_dir() {
        Some(dir) => {
            info!("Serving frontend from {}", dir.display());
            let index = ServeFile::new(dir.join("index.html"));
            router.fallback_service(ServeDir::new(dir).not_found_service(index))
        }
        None => router.fallback(handlers::not_found),
    };

    let gate_state = gate::GateState {
        backend: backend.clone(),
        secure_cookies: config.secure_cookies(),
    };

    router
        .layer(middleware::from_fn_with_state(gate_state, gate::gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(backend))
                .layer(Extension(Arc::new(config))),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, backend: Backend, config: ServerConfig) -> Result<()> {
    let app = app(backend, config);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
