//! Login, registration and session handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::{Deserialize, Serialize};
use shopfront_core::validation::validate_password;
use shopfront_core::{User, ADMIN_ROLE};
use shopfront_db::{Database, NewUser};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, Claims};
use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::AppState;

/// Role given to self-service registrations when none is named.
const DEFAULT_ROLE: &str = "cashier";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub full_name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RoleResponse {
    pub username: String,
    pub role: String,
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    // Same message for every failure so usernames can't be enumerated
    let rejected = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = state
        .db
        .users()
        .find_by_username(&request.username)
        .await?
        .ok_or_else(rejected)?;

    if !user.is_active || !verify_password(&request.password, &user.password_hash) {
        warn!(username = %request.username, "Login rejected");
        return Err(rejected());
    }

    let token = state.jwt.issue(&user)?;
    state
        .sessions
        .record_login(&user.username, &user.role_name)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(username = %user.username, role = %user.role_name, "User logged in");
    Ok(Json(LoginResponse {
        token,
        expires_in: state.config.jwt_lifetime_secs,
        user,
    }))
}

/// `POST /api/auth/register` (admin only)
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;
    validate_password(&request.password)?;

    let role_name = request.role.as_deref().unwrap_or(DEFAULT_ROLE);
    let role = state.db.users().role_by_name(role_name).await?;

    let user = state
        .db
        .users()
        .create(&NewUser {
            username: request.username,
            full_name: request.full_name,
            password_hash: hash_password(&request.password)?,
            role_id: role.id,
        })
        .await?;

    info!(by = %claims.sub, username = %user.username, role = %user.role_name, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/auth/role`: the role stored for the caller at login.
pub async fn role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .sessions
        .role(&claims.sub)
        .await
        .ok_or_else(|| ApiError::Unauthorized(format!("No active session for {}", claims.sub)))?;

    Ok(Json(RoleResponse {
        username: claims.sub,
        role,
    }))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .remove(&claims.sub)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(username = %claims.sub, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Creates the `admin` user when no user exists yet. Returns whether one
/// was created.
pub async fn bootstrap_admin(db: &Database, password: &str) -> ApiResult<bool> {
    if db.users().count().await? > 0 {
        return Ok(false);
    }
    validate_password(password)?;

    let role = db.users().role_by_name(ADMIN_ROLE).await?;
    db.users()
        .create(&NewUser {
            username: "admin".to_string(),
            full_name: "Administrator".to_string(),
            password_hash: hash_password(password)?,
            role_id: role.id,
        })
        .await?;

    info!("Bootstrap admin user created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_claims, claims_for, state, ADMIN_PASSWORD};

    fn login_request(username: &str, password: &str) -> Json<LoginRequest> {
        Json(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[tokio::test]
    async fn test_login_records_session_and_role() {
        let (state, _dir) = state().await;

        let Json(response) = login(State(state.clone()), login_request("admin", ADMIN_PASSWORD))
            .await
            .unwrap();
        assert_eq!(response.user.username, "admin");

        let claims = state.jwt.validate(&response.token).unwrap();
        assert!(claims.is_admin());

        let Json(role_response) = role(State(state.clone()), Extension(claims.clone()))
            .await
            .unwrap();
        assert_eq!(role_response.role, ADMIN_ROLE);

        let status = logout(State(state.clone()), Extension(claims.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(matches!(
            role(State(state), Extension(claims)).await,
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (state, _dir) = state().await;

        for (username, password) in [("admin", "wrong-password"), ("nobody", ADMIN_PASSWORD)] {
            let result = login(State(state.clone()), login_request(username, password)).await;
            assert!(matches!(result, Err(ApiError::Unauthorized(_))));
        }

        let admin = state.db.users().find_by_username("admin").await.unwrap().unwrap();
        state.db.users().set_active(admin.id, false).await.unwrap();
        let result = login(State(state), login_request("admin", ADMIN_PASSWORD)).await;
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_register_requires_admin() {
        let (state, _dir) = state().await;
        let request = || {
            Json(RegisterRequest {
                username: "carol".to_string(),
                full_name: "Carol Example".to_string(),
                password: "password123".to_string(),
                role: None,
            })
        };

        let cashier = claims_for(&state, "bob", "cashier").await;
        let result = register(State(state.clone()), Extension(cashier), request()).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));

        let admin = admin_claims(&state).await;
        let (status, Json(user)) = register(State(state.clone()), Extension(admin.clone()), request())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user.role_name, DEFAULT_ROLE);

        let duplicate = register(State(state.clone()), Extension(admin.clone()), request()).await;
        assert!(matches!(duplicate, Err(ApiError::Conflict(_))));

        let short_password = register(
            State(state),
            Extension(admin),
            Json(RegisterRequest {
                username: "dave".to_string(),
                full_name: "Dave Example".to_string(),
                password: "short".to_string(),
                role: Some("manager".to_string()),
            }),
        )
        .await;
        assert!(matches!(short_password, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_once() {
        let (state, _dir) = state().await;
        assert!(!bootstrap_admin(&state.db, ADMIN_PASSWORD).await.unwrap());
        assert_eq!(state.db.users().count().await.unwrap(), 1);
    }
}
