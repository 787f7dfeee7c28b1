//! # User Repository
//!
//! Users and roles. Password hashing happens in the API layer; this module
//! only stores and returns the PHC string.

use chrono::Utc;
use shopfront_core::validation::{validate_name, validate_username};
use shopfront_core::{Role, User};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = r#"
    SELECT u.id, u.username, u.full_name, u.password_hash, u.role_id,
           r.name AS role_name, u.is_active, u.created_at
    FROM users u
    INNER JOIN userroles r ON r.id = u.role_id
"#;

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    /// Already hashed.
    pub password_hash: String,
    pub role_id: i64,
}

/// Repository for user and role operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username taken
    /// * `Err(DbError::ForeignKeyViolation)` - unknown role id
    pub async fn create(&self, user: &NewUser) -> DbResult<User> {
        validate_username(&user.username)?;
        validate_name("full name", &user.full_name, 100)?;

        debug!(username = %user.username, role_id = user.role_id, "Creating user");

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, full_name, password_hash, role_id, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            "#,
        )
        .bind(user.username.trim())
        .bind(user.full_name.trim())
        .bind(&user.password_hash)
        .bind(user.role_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: user.username.clone(),
            },
            other => other,
        })?;

        self.get(result.last_insert_rowid()).await
    }

    /// Gets a user by id.
    pub async fn get(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>(&format!("{USER_COLUMNS} WHERE u.id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id.to_string()))
    }

    /// Looks up a user for login.
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{USER_COLUMNS} WHERE u.username = ?1"))
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists all users by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{USER_COLUMNS} ORDER BY u.username"))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Assigns a different role.
    pub async fn set_role(&self, id: i64, role_id: i64) -> DbResult<User> {
        debug!(id, role_id, "Changing user role");

        let result = sqlx::query("UPDATE users SET role_id = ?1 WHERE id = ?2")
            .bind(role_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }
        self.get(id).await
    }

    /// Enables or disables login for a user.
    pub async fn set_active(&self, id: i64, active: bool) -> DbResult<()> {
        debug!(id, active, "Changing user active flag");

        let result = sqlx::query("UPDATE users SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    /// Deletes a user.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id.to_string()));
        }
        Ok(())
    }

    /// Counts users (bootstrap check).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub async fn list_roles(&self) -> DbResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM userroles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    /// Resolves a role name to its row.
    pub async fn role_by_name(&self, name: &str) -> DbResult<Role> {
        sqlx::query_as::<_, Role>("SELECT id, name FROM userroles WHERE name = ?1")
            .bind(name.trim().to_ascii_lowercase())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Role", name))
    }

    /// Returns the name of a role id.
    pub async fn role_name(&self, role_id: i64) -> DbResult<String> {
        sqlx::query_scalar::<_, String>("SELECT name FROM userroles WHERE id = ?1")
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Role", role_id.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_user(username: &str, role_id: i64) -> NewUser {
        NewUser {
            username: username.to_string(),
            full_name: "Test User".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role_id,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = setup().await;
        let repo = db.users();

        let user = repo.create(&new_user("alice", 1)).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role_name, "admin");
        assert!(user.is_admin());
        assert!(user.is_active);

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "$argon2id$stub");

        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = setup().await;
        let repo = db.users();

        repo.create(&new_user("alice", 3)).await.unwrap();
        let err = repo.create(&new_user("alice", 2)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "alice"));
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let db = setup().await;
        let err = db.users().create(&new_user("carol", 99)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_role_changes_and_delete() {
        let db = setup().await;
        let repo = db.users();
        let user = repo.create(&new_user("dave", 3)).await.unwrap();

        let cashier = repo.role_by_name("Cashier").await.unwrap();
        assert_eq!(cashier.id, 3);

        let user = repo.set_role(user.id, 2).await.unwrap();
        assert_eq!(user.role_name, "manager");

        repo.set_active(user.id, false).await.unwrap();
        assert!(!repo.get(user.id).await.unwrap().is_active);

        assert_eq!(repo.count().await.unwrap(), 1);
        repo.delete(user.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(matches!(
            repo.delete(user.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_seeded_roles() {
        let db = setup().await;
        let repo = db.users();

        let names: Vec<String> = repo
            .list_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["admin", "manager", "cashier"]);
        assert_eq!(repo.role_name(2).await.unwrap(), "manager");
    }
}
