use super::{decode, Backend, BackendError, Credential};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

impl Backend {
    /// Call a stored procedure with named arguments.
    ///
    /// # Errors
    /// Returns an error if the procedure fails or its result cannot be decoded.
    #[instrument(skip(self, credential, args))]
    pub async fn rpc<A: Serialize, T: DeserializeOwned>(
        &self,
        credential: Credential<'_>,
        function: &str,
        args: &A,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        let body = serde_json::to_value(args)?;
        let response = self
            .execute(Method::POST, url, credential, Some(body), None)
            .await?;
        decode(response).await
    }
}
