//! Session endpoints: password login, logout and the current session.

use crate::{
    api::{
        error::{ApiError, ErrorBody},
        session::{self, authenticate, fetch_profile, Principal},
        ServerConfig,
    },
    backend::{AuthUser, Backend, Credential, Query},
    domain::{navigation, NavItem, Profile, Record},
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: AuthUser,
    pub profile: Option<Profile>,
    /// Screens the caller's role may open, in menu order.
    pub navigation: Vec<NavItem>,
}

impl SessionResponse {
    fn new(user: AuthUser, profile: Option<Profile>) -> Self {
        // No profile row means no role, so nothing is navigable yet.
        let navigation = profile
            .as_ref()
            .map(|profile| navigation(profile.role))
            .unwrap_or_default();
        Self {
            user,
            profile,
            navigation,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, session cookies set", body = SessionResponse),
        (status = 400, description = "Invalid input or credentials", body = ErrorBody),
        (status = 500, description = "Server configuration error", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    backend: Extension<Backend>,
    config: Extension<Arc<ServerConfig>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::bad_request("Email and password are required"));
    };
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let auth = backend
        .sign_in_with_password(email, &request.password)
        .await
        .map_err(ApiError::upstream)?;

    let query = Query::table(Profile::TABLE)
        .select("*")
        .eq("id", auth.user.id);
    let profile = backend
        .select_one::<Profile>(Credential::User(&auth.access_token), &query)
        .await?;

    let cookies = session::session_cookies(&auth, config.secure_cookies()).map_err(|err| {
        error!("Failed to build session cookies: {err}");
        ApiError::internal("Failed to create session")
    })?;

    let mut headers = HeaderMap::new();
    for cookie in cookies {
        headers.append(SET_COOKIE, cookie);
    }

    Ok((
        StatusCode::OK,
        headers,
        Json(SessionResponse::new(auth.user, profile)),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    backend: Extension<Backend>,
    config: Extension<Arc<ServerConfig>>,
) -> impl IntoResponse {
    if let Some(token) = session::extract_access_token(&headers) {
        if let Err(err) = backend.sign_out(&token).await {
            warn!("Failed to revoke session upstream: {err}");
        }
    }

    // Always clear the cookies, even if the upstream session was already gone.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookies) = session::cleared_cookies(config.secure_cookies()) {
        for cookie in cookies {
            response_headers.append(SET_COOKIE, cookie);
        }
    }
    (StatusCode::NO_CONTENT, response_headers)
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn current_session(
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Response, ApiError> {
    let principal: Principal = match authenticate(&headers, &backend).await {
        Ok(Some(principal)) => principal,
        Ok(None) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(err) => return Err(err),
    };

    let profile = fetch_profile(&backend, &principal).await?;
    let user = AuthUser {
        id: principal.user_id,
        email: principal.email.clone(),
    };
    Ok((StatusCode::OK, Json(SessionResponse::new(user, profile))).into_response())
}
