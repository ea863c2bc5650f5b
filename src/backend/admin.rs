//! Privileged account lifecycle through the service-role key.

use super::{decode, AuthUser, Backend, BackendError, Credential, KeyKind};
use crate::domain::{NewProfile, Profile};
use reqwest::Method;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

pub struct AdminClient<'a> {
    backend: &'a Backend,
}

impl Backend {
    /// Borrow the privileged client.
    ///
    /// # Errors
    /// Returns [`BackendError::MissingKey`] when the service-role key is not configured.
    pub fn admin(&self) -> Result<AdminClient<'_>, BackendError> {
        if self.has_service_role_key() {
            Ok(AdminClient { backend: self })
        } else {
            Err(BackendError::MissingKey(KeyKind::ServiceRole))
        }
    }
}

impl AdminClient<'_> {
    /// Create a confirmed auth account carrying `full_name` in its metadata.
    ///
    /// # Errors
    /// Returns [`BackendError::Api`] with the upstream message, e.g. for a duplicate email.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthUser, BackendError> {
        let url = self.backend.endpoint("auth/v1/admin/users")?;
        let body = json!({
            "email": email,
            "password": password,
            "email_confirm": true,
            "user_metadata": { "full_name": full_name },
        });
        let response = self
            .backend
            .execute(Method::POST, url, Credential::Service, Some(body), None)
            .await?;
        decode(response).await
    }

    /// # Errors
    /// Returns an error if the hosted auth rejects the update.
    #[instrument(skip(self, password))]
    pub async fn update_user_password(
        &self,
        user_id: Uuid,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let url = self
            .backend
            .endpoint(&format!("auth/v1/admin/users/{user_id}"))?;
        let body = json!({ "password": password });
        let response = self
            .backend
            .execute(Method::PUT, url, Credential::Service, Some(body), None)
            .await?;
        decode(response).await
    }

    /// # Errors
    /// Returns an error if the hosted auth rejects the delete.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), BackendError> {
        let url = self
            .backend
            .endpoint(&format!("auth/v1/admin/users/{user_id}"))?;
        self.backend
            .execute(Method::DELETE, url, Credential::Service, None, None)
            .await?;
        Ok(())
    }

    /// Insert a profile row, bypassing row-level security.
    ///
    /// # Errors
    /// Returns an error if the insert is rejected.
    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    pub async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, BackendError> {
        self.backend
            .insert(Credential::Service, "profiles", profile)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::backend::{tests::test_backend, Backend, BackendError, KeyKind};
    use crate::cli::globals::GlobalArgs;
    use anyhow::Result;
    use serde_json::json;
    use uuid::Uuid;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn admin_requires_service_role_key() {
        let backend = Backend::new(&GlobalArgs::new("https://project.supabase.co".to_string())).unwrap();
        assert!(matches!(
            backend.admin().err(),
            Some(BackendError::MissingKey(KeyKind::ServiceRole))
        ));
    }

    #[tokio::test]
    async fn create_user_uses_service_key() -> Result<()> {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(body_json(json!({
                "email": "ion@depozit.ro",
                "password": "secret1",
                "email_confirm": true,
                "user_metadata": {"full_name": "Ion Pop"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": user_id,
                "email": "ion@depozit.ro"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        let user = backend
            .admin()?
            .create_user("ion@depozit.ro", "secret1", "Ion Pop")
            .await?;
        assert_eq!(user.id, user_id);
        Ok(())
    }

    #[tokio::test]
    async fn delete_user_targets_id() -> Result<()> {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("DELETE"))
            .and(path(format!("/auth/v1/admin/users/{user_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let backend = test_backend(&server.uri());
        backend.admin()?.delete_user(user_id).await?;
        Ok(())
    }
}
