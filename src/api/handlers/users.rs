//! Admin-only account management.
//!
//! Flow Overview:
//! 1) Fail with 500 when the anon or service-role key is not configured.
//! 2) Authenticate the caller and require the `admin` profile role.
//! 3) Validate the payload, then forward to the privileged admin client.
//!
//! Creating an account is two writes (auth user, then profile row). When the
//! profile insert fails the auth user is deleted again, best effort.

use super::MessageResponse;
use crate::{
    api::{
        error::{ApiError, ErrorBody},
        session::require_admin,
    },
    backend::{Backend, BackendError, KeyKind, Query},
    domain::{NewProfile, Profile, Record, Role},
};
use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    /// `admin` or `employee`; defaults to `employee`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub message: String,
    pub user: CreatedUser,
}

/// Both keys are needed: the anon key to resolve the caller, the service-role
/// key for the admin API.
fn ensure_keys(backend: &Backend) -> Result<(), ApiError> {
    if !backend.has_anon_key() {
        return Err(BackendError::MissingKey(KeyKind::Anon).into());
    }
    if !backend.has_service_role_key() {
        return Err(BackendError::MissingKey(KeyKind::ServiceRole).into());
    }
    Ok(())
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn parse_user_id(user_id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(user_id.trim()).map_err(|_| ApiError::bad_request("Invalid user id"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Validated create payload.
struct NewUser<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
    role: Role,
}

fn validate(request: &CreateUserRequest) -> Result<NewUser<'_>, ApiError> {
    let (Some(email), Some(password), Some(full_name)) = (
        non_empty(request.email.as_deref()),
        request.password.as_deref().filter(|value| !value.is_empty()),
        non_empty(request.full_name.as_deref()),
    ) else {
        return Err(ApiError::bad_request(
            "Email, password and full name are required",
        ));
    };

    check_password(password)?;

    let role = match non_empty(request.role.as_deref()) {
        None => Role::Employee,
        Some(role) => role
            .parse::<Role>()
            .map_err(|()| ApiError::bad_request("Role must be admin or employee"))?,
    };

    Ok(NewUser {
        email,
        password,
        full_name,
        role,
    })
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All profiles, newest first", body = [Profile]),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let (principal, _) = require_admin(&headers, &backend).await?;
    let (column, ascending) = Profile::ORDER_BY;
    let query = Query::table(Profile::TABLE)
        .select("*")
        .order(column, ascending);
    Ok(Json(backend.select(principal.credential(), &query).await?))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid input or upstream rejection", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 500, description = "Server configuration error or profile insert failed", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn create_user(
    headers: HeaderMap,
    backend: Extension<Backend>,
    payload: Option<Json<CreateUserRequest>>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    ensure_keys(&backend)?;
    let (principal, _) = require_admin(&headers, &backend).await?;

    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let new_user = validate(&request)?;

    let admin = backend.admin()?;
    let user = admin
        .create_user(new_user.email, new_user.password, new_user.full_name)
        .await
        .map_err(ApiError::upstream)?;

    let profile = NewProfile {
        id: user.id,
        full_name: new_user.full_name.to_string(),
        email: new_user.email.to_string(),
        role: new_user.role,
    };

    if let Err(err) = admin.insert_profile(&profile).await {
        error!("Failed to create profile for user {}: {err}", user.id);
        if let Err(err) = admin.delete_user(user.id).await {
            error!("Failed to delete orphaned auth user {}: {err}", user.id);
        }
        return Err(ApiError::internal("Failed to create user profile"));
    }

    info!(created_by = %principal.user_id, user_id = %user.id, role = new_user.role.as_str(), "user created");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully".to_string(),
            user: CreatedUser {
                id: user.id,
                email: profile.email,
                full_name: profile.full_name,
                role: profile.role,
            },
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "Auth user id")
    ),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid input or upstream rejection", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 500, description = "Server configuration error", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn update_user(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    backend: Extension<Backend>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_keys(&backend)?;
    let (principal, _) = require_admin(&headers, &backend).await?;

    let user_id = parse_user_id(&user_id)?;
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let password = request.password.unwrap_or_default();
    check_password(&password)?;

    backend
        .admin()?
        .update_user_password(user_id, &password)
        .await
        .map_err(ApiError::upstream)?;

    info!(updated_by = %principal.user_id, %user_id, "password updated");

    Ok(MessageResponse::new("Password updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}",
    params(
        ("user_id" = String, Path, description = "Auth user id")
    ),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Own account, invalid id or upstream rejection", body = ErrorBody),
        (status = 401, description = "Missing or invalid session", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 500, description = "Server configuration error", body = ErrorBody)
    ),
    tag = "users"
)]
pub async fn delete_user(
    Path(user_id): Path<String>,
    headers: HeaderMap,
    backend: Extension<Backend>,
) -> Result<Json<MessageResponse>, ApiError> {
    ensure_keys(&backend)?;
    let (principal, _) = require_admin(&headers, &backend).await?;

    let user_id = parse_user_id(&user_id)?;
    if user_id == principal.user_id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    backend
        .admin()?
        .delete_user(user_id)
        .await
        .map_err(ApiError::upstream)?;

    info!(deleted_by = %principal.user_id, %user_id, "user deleted");

    Ok(MessageResponse::new("User deleted successfully"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::tests::test_backend;
    use crate::cli::globals::GlobalArgs;
    use anyhow::Result;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        routing::{get, patch},
        Router,
    };
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, header, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(backend: Backend) -> Router {
        Router::new()
            .route("/api/users", get(list_users).post(create_user))
            .route("/api/users/:user_id", patch(update_user).delete(delete_user))
            .layer(Extension(backend))
    }

    /// Mount the session lookup and profile row for a caller with `role`.
    async fn mount_caller(server: &MockServer, caller: Uuid, role: &str) {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer caller-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": caller, "email": "boss@depozit.ro"})),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(header("authorization", "Bearer caller-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": caller, "full_name": "Boss", "email": "boss@depozit.ro", "role": role}
            ])))
            .mount(server)
            .await;
    }

    /// Any call to the admin API fails the test through `.expect(0)`.
    async fn forbid_admin_calls(server: &MockServer) {
        Mock::given(path_regex("^/auth/v1/admin/.*"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", "Bearer caller-token");
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Result<Value> {
        Ok(serde_json::from_slice(
            &to_bytes(response.into_body(), usize::MAX).await?,
        )?)
    }

    fn new_user_body() -> Value {
        json!({
            "email": "ion@depozit.ro",
            "password": "secret1",
            "full_name": "Ion Pop",
            "role": "employee"
        })
    }

    #[tokio::test]
    async fn create_user_inserts_profile() -> Result<()> {
        let server = MockServer::start().await;
        let caller = Uuid::new_v4();
        let created = Uuid::new_v4();
        mount_caller(&server, caller, "admin").await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": created, "email": "ion@depozit.ro"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .and(header("authorization", "Bearer service-key"))
            .and(body_json(json!({
                "id": created,
                "full_name": "Ion Pop",
                "email": "ion@depozit.ro",
                "role": "employee"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": created,
                "full_name": "Ion Pop",
                "email": "ion@depozit.ro",
                "role": "employee"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("POST", "/api/users", Some(new_user_body())))
            .await?;

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            json_body(response).await?,
            json!({
                "message": "User created successfully",
                "user": {
                    "id": created,
                    "email": "ion@depozit.ro",
                    "full_name": "Ion Pop",
                    "role": "employee"
                }
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_surfaces_upstream_message() -> Result<()> {
        let server = MockServer::start().await;
        mount_caller(&server, Uuid::new_v4(), "admin").await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "code": 422,
                "error_code": "email_exists",
                "msg": "A user with this email address has already been registered"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("POST", "/api/users", Some(new_user_body())))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await?,
            json!({"error": "A user with this email address has already been registered"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_profile_insert_deletes_auth_user() -> Result<()> {
        let server = MockServer::start().await;
        let created = Uuid::new_v4();
        mount_caller(&server, Uuid::new_v4(), "admin").await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": created, "email": "ion@depozit.ro"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"profiles_pkey\""
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/auth/v1/admin/users/{created}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("POST", "/api/users", Some(new_user_body())))
            .await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await?,
            json!({"error": "Failed to create user profile"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_compensation_keeps_original_error() -> Result<()> {
        let server = MockServer::start().await;
        let created = Uuid::new_v4();
        mount_caller(&server, Uuid::new_v4(), "admin").await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/admin/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": created})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/profiles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/auth/v1/admin/users/{created}")))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("POST", "/api/users", Some(new_user_body())))
            .await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await?,
            json!({"error": "Failed to create user profile"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn non_admin_is_forbidden_on_every_endpoint() -> Result<()> {
        let server = MockServer::start().await;
        mount_caller(&server, Uuid::new_v4(), "employee").await;
        forbid_admin_calls(&server).await;

        let target = Uuid::new_v4();
        let requests = [
            request("POST", "/api/users", Some(new_user_body())),
            request("POST", "/api/users", Some(json!({"email": ""}))),
            request("POST", "/api/users", None),
            request(
                "PATCH",
                &format!("/api/users/{target}"),
                Some(json!({"password": "x"})),
            ),
            request("PATCH", "/api/users/not-a-uuid", None),
            request("DELETE", &format!("/api/users/{target}"), None),
            request("GET", "/api/users", None),
        ];

        let app = app(test_backend(&server.uri()));
        for request in requests {
            let response = app.clone().oneshot(request).await?;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(json_body(response).await?, json!({"error": "Forbidden"}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn profile_without_known_role_is_forbidden() -> Result<()> {
        let caller = Uuid::new_v4();
        for row in [
            json!({"id": caller, "role": null}),
            json!({"id": caller}),
            json!({"id": caller, "role": "manager"}),
        ] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/auth/v1/user"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": caller})))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/rest/v1/profiles"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
                .mount(&server)
                .await;
            forbid_admin_calls(&server).await;

            let response = app(test_backend(&server.uri()))
                .oneshot(request(
                    "DELETE",
                    &format!("/api/users/{}", Uuid::new_v4()),
                    None,
                ))
                .await?;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
            assert_eq!(json_body(response).await?, json!({"error": "Forbidden"}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn missing_session_is_unauthorized() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
            .mount(&server)
            .await;
        forbid_admin_calls(&server).await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("POST", "/api/users", Some(new_user_body())))
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn self_delete_is_rejected_without_deleting() -> Result<()> {
        let server = MockServer::start().await;
        let caller = Uuid::new_v4();
        mount_caller(&server, caller, "admin").await;
        forbid_admin_calls(&server).await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("DELETE", &format!("/api/users/{caller}"), None))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await?,
            json!({"error": "You cannot delete your own account"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn delete_user_forwards_to_admin_api() -> Result<()> {
        let server = MockServer::start().await;
        let target = Uuid::new_v4();
        mount_caller(&server, Uuid::new_v4(), "admin").await;

        Mock::given(method("DELETE"))
            .and(path(format!("/auth/v1/admin/users/{target}")))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request("DELETE", &format!("/api/users/{target}"), None))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await?,
            json!({"message": "User deleted successfully"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn short_password_is_rejected_before_admin_call() -> Result<()> {
        let server = MockServer::start().await;
        mount_caller(&server, Uuid::new_v4(), "admin").await;
        forbid_admin_calls(&server).await;

        let target = Uuid::new_v4();
        let response = app(test_backend(&server.uri()))
            .oneshot(request(
                "PATCH",
                &format!("/api/users/{target}"),
                Some(json!({"password": "12345"})),
            ))
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await?,
            json!({"error": "Password must be at least 6 characters"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_password_forwards_to_admin_api() -> Result<()> {
        let server = MockServer::start().await;
        let target = Uuid::new_v4();
        mount_caller(&server, Uuid::new_v4(), "admin").await;

        Mock::given(method("PUT"))
            .and(path(format!("/auth/v1/admin/users/{target}")))
            .and(body_json(json!({"password": "secret12"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": target})))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(test_backend(&server.uri()))
            .oneshot(request(
                "PATCH",
                &format!("/api/users/{target}"),
                Some(json!({"password": "secret12"})),
            ))
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await?,
            json!({"message": "Password updated successfully"})
        );
        Ok(())
    }

    #[tokio::test]
    async fn create_validates_payload() -> Result<()> {
        let server = MockServer::start().await;
        mount_caller(&server, Uuid::new_v4(), "admin").await;
        forbid_admin_calls(&server).await;
        let app = app(test_backend(&server.uri()));

        let cases = [
            (
                json!({"email": "ion@depozit.ro", "password": "secret1"}),
                "Email, password and full name are required",
            ),
            (
                json!({"email": "ion@depozit.ro", "password": "abc", "full_name": "Ion"}),
                "Password must be at least 6 characters",
            ),
            (
                json!({"email": "ion@depozit.ro", "password": "secret1", "full_name": "Ion", "role": "owner"}),
                "Role must be admin or employee",
            ),
        ];

        for (body, message) in cases {
            let response = app
                .clone()
                .oneshot(request("POST", "/api/users", Some(body)))
                .await?;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await?, json!({"error": message}));
        }
        Ok(())
    }

    #[tokio::test]
    async fn missing_service_key_is_configuration_error() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(path_regex(".*"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let mut globals = GlobalArgs::new(server.uri());
        globals.set_anon_key(SecretString::from("anon-key"));
        let backend = Backend::new(&globals)?;

        let target = Uuid::new_v4();
        for request in [
            request("POST", "/api/users", Some(new_user_body())),
            request(
                "PATCH",
                &format!("/api/users/{target}"),
                Some(json!({"password": "secret12"})),
            ),
            request("DELETE", &format!("/api/users/{target}"), None),
        ] {
            let response = app(backend.clone()).oneshot(request).await?;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                json_body(response).await?,
                json!({"error": "Server configuration error"})
            );
        }
        Ok(())
    }
}
