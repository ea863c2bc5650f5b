//! Table access through the hosted REST layer.

use super::{decode, Backend, BackendError, Credential};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt::Display;
use tracing::instrument;

const RETURN_REPRESENTATION: &str = "return=representation";

/// Table name plus query-string filters, in the hosted REST filter syntax
/// (`column=eq.value`, `order=column.desc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    params: Vec<(String, String)>,
}

impl Query {
    #[must_use]
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    #[must_use]
    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    #[must_use]
    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    #[must_use]
    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "lte", value)
    }

    #[must_use]
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.params
            .push(("order".to_string(), format!("{column}.{direction}")));
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    fn filter(mut self, column: &str, operator: &str, value: impl Display) -> Self {
        self.params
            .push((column.to_string(), format!("{operator}.{value}")));
        self
    }

    fn url(&self, backend: &Backend) -> Result<url::Url, BackendError> {
        let mut url = backend.endpoint(&format!("rest/v1/{}", self.table))?;
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

impl Backend {
    /// # Errors
    /// Returns an error if the request fails or rows cannot be decoded.
    #[instrument(skip(self, credential), fields(table = query.name()))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        credential: Credential<'_>,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .execute(Method::GET, query.url(self)?, credential, None, None)
            .await?;
        decode(response).await
    }

    /// First matching row, if any.
    ///
    /// # Errors
    /// Returns an error if the request fails or the row cannot be decoded.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        credential: Credential<'_>,
        query: &Query,
    ) -> Result<Option<T>, BackendError> {
        let query = query.clone().limit(1);
        let rows: Vec<T> = self.select(credential, &query).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    /// Returns an error if the insert is rejected or returns nothing.
    #[instrument(skip(self, credential, row))]
    pub async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        credential: Credential<'_>,
        table: &str,
        row: &B,
    ) -> Result<T, BackendError> {
        let url = Query::table(table).url(self)?;
        let body = serde_json::to_value(row)?;
        let response = self
            .execute(
                Method::POST,
                url,
                credential,
                Some(body),
                Some(RETURN_REPRESENTATION),
            )
            .await?;
        let rows: Vec<T> = decode(response).await?;
        super::single(rows)
    }

    /// Patch every row matching the query and return the updated rows.
    ///
    /// # Errors
    /// Returns an error if the update is rejected.
    #[instrument(skip(self, credential, changes), fields(table = query.name()))]
    pub async fn update<B: Serialize, T: DeserializeOwned>(
        &self,
        credential: Credential<'_>,
        query: &Query,
        changes: &B,
    ) -> Result<Vec<T>, BackendError> {
        let body = serde_json::to_value(changes)?;
        let response = self
            .execute(
                Method::PATCH,
                query.url(self)?,
                credential,
                Some(body),
                Some(RETURN_REPRESENTATION),
            )
            .await?;
        decode(response).await
    }

    /// Delete every row matching the query; returns how many went away.
    ///
    /// # Errors
    /// Returns an error if the delete is rejected.
    #[instrument(skip(self, credential), fields(table = query.name()))]
    pub async fn delete(
        &self,
        credential: Credential<'_>,
        query: &Query,
    ) -> Result<usize, BackendError> {
        let response = self
            .execute(
                Method::DELETE,
                query.url(self)?,
                credential,
                None,
                Some(RETURN_REPRESENTATION),
            )
            .await?;
        let rows: Option<Vec<Value>> = decode(response).await?;
        Ok(rows.map_or(0, |rows| rows.len()))
    }
}
