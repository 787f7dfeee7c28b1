//! User and role administration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;
use shopfront_core::{Role, User};
use tracing::info;

use crate::auth::Claims;
use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// `GET /api/users`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.db.users().list().await?))
}

/// `GET /api/roles`
pub async fn roles(State(state): State<AppState>) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.db.users().list_roles().await?))
}

/// `DELETE /api/users/{id}` (admin only)
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    claims.require_admin()?;
    if claims.uid == id {
        return Err(ApiError::Conflict(
            "Cannot delete the signed-in user".to_string(),
        ));
    }

    let user = state.db.users().get(id).await?;
    state.db.users().delete(id).await?;
    state
        .sessions
        .remove(&user.username)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(by = %claims.sub, username = %user.username, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/users/{id}/role` (admin only)
pub async fn set_role(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(request): Json<SetRoleRequest>,
) -> ApiResult<Json<User>> {
    claims.require_admin()?;

    let role = state.db.users().role_by_name(&request.role).await?;
    let user = state.db.users().set_role(id, role.id).await?;

    info!(by = %claims.sub, username = %user.username, role = %user.role_name, "Role changed");
    Ok(Json(user))
}

/// `PUT /api/users/{id}/active` (admin only)
pub async fn set_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<Json<User>> {
    claims.require_admin()?;
    if claims.uid == id && !request.active {
        return Err(ApiError::Conflict(
            "Cannot deactivate the signed-in user".to_string(),
        ));
    }

    state.db.users().set_active(id, request.active).await?;
    Ok(Json(state.db.users().get(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{admin_claims, claims_for, state};

    #[tokio::test]
    async fn test_delete_user() {
        let (state, _dir) = state().await;
        let admin = admin_claims(&state).await;
        let bob = claims_for(&state, "bob", "cashier").await;
        state.sessions.record_login("bob", "cashier").await.unwrap();

        let forbidden = delete(State(state.clone()), Extension(bob.clone()), Path(admin.uid)).await;
        assert!(matches!(forbidden, Err(ApiError::Forbidden(_))));

        let own = delete(State(state.clone()), Extension(admin.clone()), Path(admin.uid)).await;
        assert!(matches!(own, Err(ApiError::Conflict(_))));

        let status = delete(State(state.clone()), Extension(admin.clone()), Path(bob.uid))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.sessions.role("bob").await, None);

        let missing = delete(State(state), Extension(admin), Path(bob.uid)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_role_and_active_changes() {
        let (state, _dir) = state().await;
        let admin = admin_claims(&state).await;
        let bob = claims_for(&state, "bob", "cashier").await;

        let Json(user) = set_role(
            State(state.clone()),
            Extension(admin.clone()),
            Path(bob.uid),
            Json(SetRoleRequest {
                role: "manager".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(user.role_name, "manager");

        let unknown = set_role(
            State(state.clone()),
            Extension(admin.clone()),
            Path(bob.uid),
            Json(SetRoleRequest {
                role: "owner".to_string(),
            }),
        )
        .await;
        assert!(matches!(unknown, Err(ApiError::NotFound(_))));

        let Json(user) = set_active(
            State(state.clone()),
            Extension(admin),
            Path(bob.uid),
            Json(SetActiveRequest { active: false }),
        )
        .await
        .unwrap();
        assert!(!user.is_active);

        let Json(roles) = roles(State(state.clone())).await.unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "manager", "cashier"]);

        let Json(users) = list(State(state)).await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
