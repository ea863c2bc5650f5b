use crate::backend::BackendError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

pub const CONFIGURATION_ERROR: &str = "Server configuration error";

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// A failed request, as the caller sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub fn configuration() -> Self {
        Self::internal(CONFIGURATION_ERROR)
    }

    /// Upstream rejection reported as bad input, keeping the upstream message.
    /// Failures where the backend never answered keep their server status.
    #[must_use]
    pub fn upstream(err: BackendError) -> Self {
        match err {
            BackendError::Api { message, .. } => Self::bad_request(message),
            err => Self::from(err),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::MissingKey(kind) => {
                error!("Missing {kind} key, check the server configuration");
                Self::configuration()
            }
            BackendError::Api { status, message } => match status {
                status
                    if [
                        StatusCode::UNAUTHORIZED,
                        StatusCode::FORBIDDEN,
                        StatusCode::NOT_FOUND,
                    ]
                    .contains(&status) =>
                {
                    Self::new(status, message)
                }
                status if status.is_client_error() => Self::bad_request(message),
                status => {
                    error!("Backend answered {status}: {message}");
                    Self::internal(message)
                }
            },
            err => {
                error!("Backend request failed: {err}");
                Self::internal("Backend request failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::KeyKind;

    fn api(status: StatusCode, message: &str) -> BackendError {
        BackendError::Api {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn backend_errors_map_to_statuses() {
        assert_eq!(
            ApiError::from(BackendError::MissingKey(KeyKind::ServiceRole)),
            ApiError::internal(CONFIGURATION_ERROR)
        );
        assert_eq!(
            ApiError::from(api(StatusCode::UNAUTHORIZED, "JWT expired")).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(api(StatusCode::FORBIDDEN, "denied")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(api(StatusCode::CONFLICT, "duplicate key value")),
            ApiError::bad_request("duplicate key value")
        );
        assert_eq!(
            ApiError::from(api(StatusCode::BAD_GATEWAY, "down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(BackendError::EmptyResponse),
            ApiError::internal("Backend request failed")
        );
    }

    #[test]
    fn upstream_keeps_message_verbatim() {
        let err = ApiError::upstream(api(
            StatusCode::UNPROCESSABLE_ENTITY,
            "A user with this email address has already been registered",
        ));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.message(),
            "A user with this email address has already been registered"
        );

        let err = ApiError::upstream(api(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
        assert_eq!(err, ApiError::bad_request("boom"));

        let err = ApiError::upstream(BackendError::MissingKey(KeyKind::ServiceRole));
        assert_eq!(err, ApiError::configuration());
    }

    #[test]
    fn upstream_transport_failures_stay_internal() {
        let decode = serde_json::from_str::<u8>("not json").unwrap_err();
        let err = ApiError::upstream(BackendError::Decode(decode));
        assert_eq!(err, ApiError::internal("Backend request failed"));

        assert_eq!(
            ApiError::upstream(BackendError::EmptyResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
