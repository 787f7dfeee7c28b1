//! # Category Repository
//!
//! Product categories (`productcategories`). Products reference a category
//! by id; deleting a category still in use fails on the foreign key.

use shopfront_core::validation::validate_name;
use shopfront_core::Category;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for product categories.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a category. Names are unique.
    pub async fn create(&self, name: &str, description: Option<&str>) -> DbResult<Category> {
        validate_name("category name", name, 100)?;
        debug!(name = %name, "Creating category");

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO productcategories (name, description)
            VALUES (?1, ?2)
            RETURNING id, name, description
            "#,
        )
        .bind(name.trim())
        .bind(description.map(str::trim).filter(|d| !d.is_empty()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: name.trim().to_string(),
            },
            other => other,
        })?;

        Ok(category)
    }

    pub async fn get(&self, id: i64) -> DbResult<Category> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM productcategories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Category", id.to_string()))
    }

    /// Lists categories by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM productcategories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Replaces name and description.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        description: Option<&str>,
    ) -> DbResult<Category> {
        validate_name("category name", name, 100)?;
        debug!(id, name = %name, "Updating category");

        sqlx::query_as::<_, Category>(
            r#"
            UPDATE productcategories SET name = ?1, description = ?2
            WHERE id = ?3
            RETURNING id, name, description
            "#,
        )
        .bind(name.trim())
        .bind(description.map(str::trim).filter(|d| !d.is_empty()))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Category", id.to_string()))
    }

    /// Deletes a category.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - products still reference it
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting category");

        let result = sqlx::query("DELETE FROM productcategories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
