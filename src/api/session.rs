//! Session cookies, token extraction and caller authorization.
//!
//! Flow Overview: read the access token from the `Authorization` header or the
//! access cookie, resolve it to a user through the hosted auth, and (for
//! role-gated endpoints) load the caller's profile row with their own token.

use super::error::ApiError;
use crate::{
    backend::{AuthSession, Backend, Credential, Query},
    domain::{Profile, Record, Role},
};
use axum::http::{
    header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use std::fmt;
use uuid::Uuid;

pub const ACCESS_COOKIE: &str = "depozit-access-token";
pub const REFRESH_COOKIE: &str = "depozit-refresh-token";

const ACCESS_MAX_AGE_SECONDS: u64 = 60 * 60;
const REFRESH_MAX_AGE_SECONDS: u64 = 60 * 60 * 24 * 30;

/// Signed-in caller.
#[derive(Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: Option<String>,
    access_token: String,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Principal {
    /// Credential that forwards the caller's token, so row-level security applies.
    #[must_use]
    pub fn credential(&self) -> Credential<'_> {
        Credential::User(&self.access_token)
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

/// Resolve the request's access token into a principal.
///
/// Returns `Ok(None)` when no token is present or the hosted auth rejects it.
///
/// # Errors
/// Returns a configuration error when the anon key is missing, or an error if
/// the hosted auth cannot be reached.
pub async fn authenticate(
    headers: &HeaderMap,
    backend: &Backend,
) -> Result<Option<Principal>, ApiError> {
    if !backend.has_anon_key() {
        return Err(ApiError::configuration());
    }
    let Some(token) = extract_access_token(headers) else {
        return Ok(None);
    };
    Ok(backend.get_user(&token).await?.map(|user| Principal {
        user_id: user.id,
        email: user.email,
        access_token: token,
    }))
}

/// Resolve the caller or answer 401.
///
/// # Errors
/// Returns 401 without a valid session.
pub async fn require_auth(headers: &HeaderMap, backend: &Backend) -> Result<Principal, ApiError> {
    authenticate(headers, backend)
        .await?
        .ok_or_else(ApiError::unauthorized)
}

/// Load the caller's own profile row.
///
/// # Errors
/// Returns an error if the lookup fails.
pub async fn fetch_profile(
    backend: &Backend,
    principal: &Principal,
) -> Result<Option<Profile>, ApiError> {
    let query = Query::table(Profile::TABLE)
        .select("*")
        .eq("id", principal.user_id);
    Ok(backend.select_one(principal.credential(), &query).await?)
}

/// Resolve the caller and check their profile role.
///
/// # Errors
/// Returns 401 without a valid session and 403 when the role does not match.
pub async fn require_role(
    headers: &HeaderMap,
    backend: &Backend,
    role: Role,
) -> Result<(Principal, Profile), ApiError> {
    let principal = require_auth(headers, backend).await?;
    match fetch_profile(backend, &principal).await? {
        Some(profile) if profile.role == role => Ok((principal, profile)),
        _ => Err(ApiError::forbidden()),
    }
}

/// # Errors
/// Returns 401 without a valid session and 403 for non-admins.
pub async fn require_admin(
    headers: &HeaderMap,
    backend: &Backend,
) -> Result<(Principal, Profile), ApiError> {
    require_role(headers, backend, Role::Admin).await
}

/// Bearer token first, then the access cookie.
#[must_use]
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, ACCESS_COOKIE))
}

#[must_use]
pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, REFRESH_COOKIE)
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            let value = value.trim();
            (key.trim() == name && !value.is_empty()).then(|| value.to_string())
        })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn cookie(
    name: &str,
    value: &str,
    max_age: u64,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` values for both tokens of a fresh session.
///
/// # Errors
/// Returns an error if a token is not a valid header value.
pub fn session_cookies(
    session: &AuthSession,
    secure: bool,
) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
    let access_max_age = session.expires_in.unwrap_or(ACCESS_MAX_AGE_SECONDS);
    Ok([
        cookie(ACCESS_COOKIE, &session.access_token, access_max_age, secure)?,
        cookie(
            REFRESH_COOKIE,
            &session.refresh_token,
            REFRESH_MAX_AGE_SECONDS,
            secure,
        )?,
    ])
}

/// `Set-Cookie` values expiring both tokens.
///
/// # Errors
/// Returns an error if the cookie cannot be encoded.
pub fn cleared_cookies(secure: bool) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
    Ok([
        cookie(ACCESS_COOKIE, "", 0, secure)?,
        cookie(REFRESH_COOKIE, "", 0, secure)?,
    ])
}
