//! Route gatekeeping for the frontend pages.
//!
//! API routes answer 401/403 themselves; this layer only decides whether a
//! page request may reach the frontend bundle. Unauthenticated requests to a
//! protected page are redirected to `/login`, signed-in users hitting `/login`
//! go to `/dashboard`. An expired access token is renewed with the refresh
//! cookie and the new cookies are set on the response.

use super::session::{extract_access_token, extract_refresh_token, session_cookies};
use crate::backend::{AuthSession, Backend};
use axum::{
    body::Body,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/dashboard";

/// Prefixes reachable without a session.
const PUBLIC_PREFIXES: [&str; 6] = [
    "/auth/",
    "/api/",
    "/api-docs/",
    "/swagger-ui",
    "/assets/",
    "/health",
];
const PUBLIC_FILES: [&str; 1] = ["/favicon.ico"];

#[derive(Clone, Debug)]
pub struct GateState {
    pub backend: Backend,
    pub secure_cookies: bool,
}

/// Whether `path` bypasses the gate entirely.
#[must_use]
pub fn is_public(path: &str) -> bool {
    PUBLIC_FILES.contains(&path) || PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

#[derive(Debug)]
enum SessionState {
    Anonymous,
    Active,
    Refreshed(AuthSession),
}

impl SessionState {
    const fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

async fn resolve(backend: &Backend, headers: &HeaderMap) -> SessionState {
    if !backend.has_anon_key() {
        return SessionState::Anonymous;
    }

    if let Some(token) = extract_access_token(headers) {
        match backend.get_user(&token).await {
            Ok(Some(_)) => return SessionState::Active,
            Ok(None) => debug!("access token rejected, trying refresh"),
            Err(err) => {
                warn!("Failed to validate session: {err}");
                return SessionState::Anonymous;
            }
        }
    }

    let Some(refresh_token) = extract_refresh_token(headers) else {
        return SessionState::Anonymous;
    };
    match backend.refresh_session(&refresh_token).await {
        Ok(session) => SessionState::Refreshed(session),
        Err(err) => {
            debug!("Failed to refresh session: {err}");
            SessionState::Anonymous
        }
    }
}

fn with_cookies(mut response: Response, state: &SessionState, secure: bool) -> Response {
    if let SessionState::Refreshed(session) = state {
        match session_cookies(session, secure) {
            Ok(cookies) => {
                for cookie in cookies {
                    response.headers_mut().append(SET_COOKIE, cookie);
                }
            }
            Err(err) => warn!("Failed to build refreshed session cookies: {err}"),
        }
    }
    response
}

pub async fn gate(State(state): State<GateState>, request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if is_public(&path) {
        return next.run(request).await;
    }

    let session = resolve(&state.backend, request.headers()).await;
    let is_login = path == LOGIN_PATH;

    let response = match (session.is_authenticated(), is_login) {
        (false, false) => Redirect::temporary(LOGIN_PATH).into_response(),
        (false, true) => next.run(request).await,
        (true, true) => Redirect::temporary(HOME_PATH).into_response(),
        (true, false) if path == "/" => Redirect::temporary(HOME_PATH).into_response(),
        (true, false) => next.run(request).await,
    };

    with_cookies(response, &session, state.secure_cookies)
}
