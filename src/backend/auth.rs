//! Hosted auth endpoints: session lookup, password sign-in, refresh, sign-out.

use super::{decode, Backend, BackendError, Credential};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens returned by a password or refresh-token grant.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .field("expires_in", &self.expires_in)
            .field("user", &self.user)
            .finish()
    }
}

impl Backend {
    /// Resolve an access token to its user.
    ///
    /// Returns `Ok(None)` when the hosted auth rejects the token.
    ///
    /// # Errors
    /// Returns an error if the request fails for any other reason.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        match self
            .execute(Method::GET, url, Credential::User(access_token), None, None)
            .await
        {
            Ok(response) => Ok(Some(decode(response).await?)),
            Err(BackendError::Api { status, message })
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                debug!("access token rejected: {message}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Password grant.
    ///
    /// # Errors
    /// Returns [`BackendError::Api`] with the upstream message on bad credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let body = json!({ "email": email, "password": password });
        let response = self
            .execute(Method::POST, url, Credential::Anon, Some(body), None)
            .await?;
        decode(response).await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    /// Returns an error if the refresh token is rejected or the request fails.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");
        let body = json!({ "refresh_token": refresh_token });
        let response = self
            .execute(Method::POST, url, Credential::Anon, Some(body), None)
            .await?;
        decode(response).await
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        self.execute(Method::POST, url, Credential::User(access_token), None, None)
            .await?;
        Ok(())
    }

    /// Ping the hosted auth health endpoint.
    ///
    /// # Errors
    /// Returns an error if the backend is unreachable or unhealthy.
    pub async fn health(&self) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/health")?;
        self.execute(Method::GET, url, Credential::Anon, None, None)
            .await?;
        Ok(())
    }
}
