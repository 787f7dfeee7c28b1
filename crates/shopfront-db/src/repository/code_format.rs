//! # Code Format Repository
//!
//! Sequential entry-code generation backed by the `codeformats` table.
//!
//! ## Atomic Increment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Why a single statement                               │
//! │                                                                         │
//! │  ❌ read-then-write (two requests can read the same value)             │
//! │     SELECT next_value ...        → 41          SELECT → 41             │
//! │     UPDATE ... next_value = 42                 UPDATE → 42             │
//! │     code = PO000042                            code = PO000042  (dup!) │
//! │                                                                         │
//! │  ✅ one UPDATE ... RETURNING (takes the write lock, then reads)        │
//! │     UPDATE codeformats SET next_value = next_value + 1                 │
//! │     WHERE code_type = 4 RETURNING prefix, pad_length, next_value       │
//! │     → caller A: 42, caller B waits on busy timeout → 43                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Composite writers call [`generate_in`] on their own transaction, so a
//! rolled-back order or invoice also rolls back its counter increment.

use shopfront_core::codes::exceeds_width;
use shopfront_core::{format_code, CodeFormat, CodeType};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Repository for entry-code formats and generation.
#[derive(Debug, Clone)]
pub struct CodeFormatRepository {
    pool: SqlitePool,
}

impl CodeFormatRepository {
    /// Creates a new CodeFormatRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CodeFormatRepository { pool }
    }

    /// Generates the next code for `code_type`, consuming a counter value.
    ///
    /// ## Returns
    /// * `Ok(code)` - e.g. `"INV000042"`
    /// * `Err(DbError::NotFound)` - no format row for this code type
    pub async fn generate(&self, code_type: CodeType) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        generate_in(&mut conn, code_type).await
    }

    /// Returns the code the next [`generate`](Self::generate) would produce,
    /// without consuming it. Another caller may take it first.
    pub async fn peek(&self, code_type: CodeType) -> DbResult<String> {
        Ok(self.get(code_type).await?.preview_next())
    }

    /// Gets the stored format for a code type.
    pub async fn get(&self, code_type: CodeType) -> DbResult<CodeFormat> {
        sqlx::query_as::<_, CodeFormat>(
            r#"
            SELECT code_type, description, prefix, pad_length, next_value
            FROM codeformats
            WHERE code_type = ?1
            "#,
        )
        .bind(code_type.id())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Code format", code_type.as_str()))
    }

    /// Lists all formats in code type order.
    pub async fn list(&self) -> DbResult<Vec<CodeFormat>> {
        let formats = sqlx::query_as::<_, CodeFormat>(
            r#"
            SELECT code_type, description, prefix, pad_length, next_value
            FROM codeformats
            ORDER BY code_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(formats)
    }

    /// Changes the prefix and padding of a format.
    ///
    /// The counter is left untouched so codes keep increasing. Changing the
    /// prefix can still collide with codes issued under an older prefix; the
    /// UNIQUE constraint on the entity table catches that at insert time.
    pub async fn update(
        &self,
        code_type: CodeType,
        prefix: &str,
        pad_length: i64,
    ) -> DbResult<CodeFormat> {
        shopfront_core::validation::validate_code("prefix", prefix)?;
        if !(0..=18).contains(&pad_length) {
            return Err(shopfront_core::ValidationError::OutOfRange {
                field: "pad length".to_string(),
                min: 0,
                max: 18,
            }
            .into());
        }

        debug!(code_type = %code_type, prefix, pad_length, "Updating code format");

        let result = sqlx::query(
            "UPDATE codeformats SET prefix = ?1, pad_length = ?2 WHERE code_type = ?3",
        )
        .bind(prefix)
        .bind(pad_length)
        .bind(code_type.id())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Code format", code_type.as_str()));
        }

        self.get(code_type).await
    }
}

/// Generates the next code on a caller-supplied connection or transaction.
///
/// ## Usage
/// ```rust,ignore
/// let mut tx = pool.begin().await?;
/// let code = generate_in(&mut tx, CodeType::Invoice).await?;
/// // ... inserts using &mut *tx ...
/// tx.commit().await?;
/// ```
pub async fn generate_in(conn: &mut SqliteConnection, code_type: CodeType) -> DbResult<String> {
    let row: Option<(String, i64, i64)> = sqlx::query_as(
        r#"
        UPDATE codeformats
        SET next_value = next_value + 1
        WHERE code_type = ?1
        RETURNING prefix, pad_length, next_value
        "#,
    )
    .bind(code_type.id())
    .fetch_optional(&mut *conn)
    .await?;

    let (prefix, pad_length, value) =
        row.ok_or_else(|| DbError::not_found("Code format", code_type.as_str()))?;

    let pad_length = pad_length.max(0) as usize;
    if exceeds_width(pad_length, value) {
        warn!(
            code_type = %code_type,
            value,
            pad_length,
            "Code counter exceeded its padding width, code will be wider"
        );
    }

    let code = format_code(&prefix, pad_length, value);
    debug!(code_type = %code_type, code = %code, "Generated code");
    Ok(code)
}

// =============================================================================
// Unit Tests
// =============================================================================
