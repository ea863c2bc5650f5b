//! Client for the hosted database service.
//!
//! Every request carries an `apikey` header plus a bearer credential. Reads and
//! writes made on behalf of a signed-in user forward that user's access token so
//! the hosted row-level security decides what they can see. Only
//! [`AdminClient`] uses the service-role key.

pub mod admin;
pub mod auth;
pub mod rest;
pub mod rpc;

pub use self::admin::AdminClient;
pub use self::auth::{AuthSession, AuthUser};
pub use self::rest::Query;

use crate::{cli::globals::GlobalArgs, APP_USER_AGENT};
use reqwest::{header::HeaderValue, Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::{debug, info_span, Instrument};
use url::Url;

const CONNECT_TIMEOUT_SECONDS: u64 = 5;
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Anon,
    ServiceRole,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anon => f.write_str("anon"),
            Self::ServiceRole => f.write_str("service-role"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("missing {0} key")]
    MissingKey(KeyKind),
    /// The hosted service answered with a non-success status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("backend returned no rows")]
    EmptyResponse,
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
}

impl BackendError {
    /// Status reported by the hosted service, if it answered at all.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Whose credentials a request runs with.
#[derive(Clone, Copy)]
pub enum Credential<'a> {
    /// Public anon key only, used before a user has signed in.
    Anon,
    /// A signed-in user's access token, subject to row-level security.
    User(&'a str),
    /// The service-role key, bypassing row-level security.
    Service,
}

impl fmt::Debug for Credential<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anon => f.write_str("Anon"),
            Self::User(_) => f.write_str("User(***)"),
            Self::Service => f.write_str("Service"),
        }
    }
}

#[derive(Clone)]
pub struct Backend {
    base_url: Url,
    anon_key: Option<SecretString>,
    service_role_key: Option<SecretString>,
    client: Client,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("base_url", &self.base_url.as_str())
            .field("anon_key", &self.anon_key.as_ref().map(|_| "***"))
            .field("service_role_key", &self.service_role_key.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl Backend {
    /// Build the shared client from the configured URL and keys.
    ///
    /// # Errors
    /// Returns an error if the URL cannot be parsed or the HTTP client cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self, BackendError> {
        let mut base_url = Url::parse(globals.backend_url.trim())?;
        // Url::join replaces the last segment unless the base ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            base_url,
            anon_key: globals.anon_key.clone(),
            service_role_key: globals.service_role_key.clone(),
            client,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn has_anon_key(&self) -> bool {
        self.anon_key.is_some()
    }

    #[must_use]
    pub fn has_service_role_key(&self) -> bool {
        self.service_role_key.is_some()
    }

    /// Resolve a path relative to the backend base URL.
    ///
    /// # Errors
    /// Returns an error if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let url = self.base_url.join(path.trim_start_matches('/'))?;
        debug!("backend endpoint: {}", url);
        Ok(url)
    }

    fn credential_headers<'s>(
        &'s self,
        credential: Credential<'s>,
    ) -> Result<(&'s str, &'s str), BackendError> {
        let anon = || {
            self.anon_key
                .as_ref()
                .map(ExposeSecret::expose_secret)
                .ok_or(BackendError::MissingKey(KeyKind::Anon))
        };

        match credential {
            Credential::Anon => {
                let key = anon()?;
                Ok((key, key))
            }
            Credential::User(token) => Ok((anon()?, token)),
            Credential::Service => {
                let key = self
                    .service_role_key
                    .as_ref()
                    .map(ExposeSecret::expose_secret)
                    .ok_or(BackendError::MissingKey(KeyKind::ServiceRole))?;
                Ok((key, key))
            }
        }
    }

    /// Send one request and turn non-success statuses into [`BackendError::Api`].
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: Url,
        credential: Credential<'_>,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<Response, BackendError> {
        let (apikey, bearer) = self.credential_headers(credential)?;

        let span = info_span!(
            "backend.request",
            http.method = %method,
            http.path = url.path(),
            credential = ?credential
        );

        let mut builder = self
            .client
            .request(method, url)
            .header("apikey", apikey)
            .bearer_auth(bearer);

        if let Some(prefer) = prefer {
            builder = builder.header("Prefer", HeaderValue::from_static(prefer));
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder.send().instrument(span).await?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        Err(BackendError::Api {
            status,
            message: error_message(status, &text),
        })
    }
}

/// Decode a JSON body; an empty body decodes as `null`.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Return the only row of a representation response.
pub(crate) fn single<T>(rows: Vec<T>) -> Result<T, BackendError> {
    rows.into_iter().next().ok_or(BackendError::EmptyResponse)
}

/// Pick the human readable message out of an auth or REST error body.
fn error_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|json| {
        ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|key| json.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    });

    from_json
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && parsed.is_none()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Backend request failed")
                .to_string()
        })
}
