//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD keyed by SKU
//! - Name/SKU search
//! - Stock restock and batch deduction
//!
//! ## Stock Deduction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Conditional Decrement                                │
//! │                                                                         │
//! │  ❌ WRONG: read, check, write (two tills can both see 10 in stock)     │
//! │     SELECT quantity → 10;  10 >= 4 ✓;  UPDATE SET quantity = 6          │
//! │                                                                         │
//! │  ✅ CORRECT: the check IS the write                                    │
//! │     UPDATE products SET quantity = quantity - 4                         │
//! │     WHERE sku = ? AND quantity >= 4                                     │
//! │     rows_affected == 0  →  InsufficientStock, whole batch rolls back    │
//! │                                                                         │
//! │  Stock 10, three deductions of 4:  6 ✓  2 ✓  ✗ (stays 2)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use shopfront_core::validation::{
    validate_amount_cents, validate_code, validate_deductions, validate_max_discount,
    validate_name, validate_quantity, validate_stock_level,
};
use shopfront_core::{CodeType, Product, StockDeduction};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::code_format::generate_in;

pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, sku, name, category_id, quantity, cost_cents, price_cents,
    max_discount, created_at, updated_at
"#;

/// Product fields as submitted for create and update.
///
/// On create, a missing `sku` is generated from the product code format.
/// On update, `sku` is ignored: the row is addressed by its existing SKU.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub quantity: i64,
    pub cost_cents: i64,
    pub price_cents: i64,
    #[serde(default)]
    pub max_discount: i64,
}

impl NewProduct {
    fn validate(&self) -> DbResult<()> {
        validate_name("name", &self.name, 200)?;
        validate_stock_level(self.quantity)?;
        validate_amount_cents("cost", self.cost_cents)?;
        validate_amount_cents("price", self.price_cents)?;
        validate_max_discount(self.max_discount)?;
        Ok(())
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let results = repo.search("beans", 20).await?;
/// let product = repo.get_by_sku("PRD00001").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// The SKU is generated inside the insert transaction when not supplied,
    /// so a failed insert does not consume a code.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category
    pub async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        product.validate()?;

        let mut tx = self.pool.begin().await?;

        let sku = match product.sku.as_deref().map(str::trim) {
            Some(sku) if !sku.is_empty() => {
                validate_code("sku", sku)?;
                sku.to_string()
            }
            _ => generate_in(&mut tx, CodeType::Product).await?,
        };

        debug!(sku = %sku, "Inserting product");

        let now = Utc::now();
        let created = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                sku, name, category_id, quantity, cost_cents, price_cents,
                max_discount, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&sku)
        .bind(product.name.trim())
        .bind(product.category_id)
        .bind(product.quantity)
        .bind(product.cost_cents)
        .bind(product.price_cents)
        .bind(product.max_discount)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: sku.clone(),
            },
            other => other,
        })?;

        tx.commit().await?;

        info!(sku = %created.sku, "Product created");
        Ok(created)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// Lists all products by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, sku"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Searches products by name or SKU substring.
    ///
    /// An empty query returns the first `limit` products by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        // Escape LIKE wildcards typed by the user
        let pattern = format!(
            "%{}%",
            query
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        );

        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\'
            ORDER BY name, sku
            LIMIT ?2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Replaces every editable field of the product with `sku`.
    pub async fn update(&self, sku: &str, product: &NewProduct) -> DbResult<Product> {
        product.validate()?;
        debug!(sku = %sku, "Updating product");

        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = ?1,
                category_id = ?2,
                quantity = ?3,
                cost_cents = ?4,
                price_cents = ?5,
                max_discount = ?6,
                updated_at = ?7
            WHERE sku = ?8
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.name.trim())
        .bind(product.category_id)
        .bind(product.quantity)
        .bind(product.cost_cents)
        .bind(product.price_cents)
        .bind(product.max_discount)
        .bind(Utc::now())
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// Deletes a product.
    pub async fn delete(&self, sku: &str) -> DbResult<()> {
        debug!(sku = %sku, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE sku = ?1")
            .bind(sku)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", sku));
        }
        Ok(())
    }

    /// Adds `quantity` units to stock.
    pub async fn restock(&self, sku: &str, quantity: i64) -> DbResult<Product> {
        validate_quantity(quantity)?;
        debug!(sku = %sku, quantity, "Restocking product");

        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET quantity = quantity + ?1, updated_at = ?2
            WHERE sku = ?3
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(quantity)
        .bind(Utc::now())
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", sku))
    }

    /// Deducts a batch of quantities, all or nothing.
    ///
    /// ## Returns
    /// * `Ok(())` - every entry applied
    /// * `Err(DbError::InsufficientStock)` - first entry that could not be
    ///   covered; no entry of the batch is applied
    /// * `Err(DbError::NotFound)` - unknown SKU; nothing applied
    pub async fn deduct_stock(&self, entries: &[StockDeduction]) -> DbResult<()> {
        validate_deductions(entries)?;
        debug!(entries = entries.len(), "Deducting stock");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for entry in entries {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - ?1, updated_at = ?2
                WHERE sku = ?3 AND quantity >= ?1
                "#,
            )
            .bind(entry.quantity)
            .bind(now)
            .bind(&entry.sku)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE sku = ?1")
                    .bind(&entry.sku)
                    .fetch_optional(&mut *tx)
                    .await?;

                // tx dropped here, rolling back earlier entries
                return Err(match exists {
                    Some(_) => DbError::InsufficientStock {
                        sku: entry.sku.clone(),
                        requested: entry.quantity,
                    },
                    None => DbError::not_found("Product", &entry.sku),
                });
            }
        }

        tx.commit().await?;
        info!(entries = entries.len(), "Stock deducted");
        Ok(())
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
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

    fn beans(quantity: i64) -> NewProduct {
        NewProduct {
            sku: None,
            name: "Espresso Beans 1kg".to_string(),
            category_id: None,
            quantity,
            cost_cents: 1200,
            price_cents: 2000,
            max_discount: 10,
        }
    }

    fn deduction(sku: &str, quantity: i64) -> StockDeduction {
        StockDeduction {
            sku: sku.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_create_generates_sku() {
        let db = setup().await;
        let repo = db.products();

        let first = repo.create(&beans(10)).await.unwrap();
        let second = repo.create(&beans(5)).await.unwrap();
        assert_eq!(first.sku, "PRD00001");
        assert_eq!(second.sku, "PRD00002");
        assert!(first.discount_allowed());
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_create_with_supplied_sku() {
        let db = setup().await;
        let repo = db.products();

        let mut product = beans(1);
        product.sku = Some("BEANS-1KG".to_string());
        let created = repo.create(&product).await.unwrap();
        assert_eq!(created.sku, "BEANS-1KG");

        let err = repo.create(&product).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "BEANS-1KG"));

        // Supplied SKUs leave the counter alone
        assert_eq!(db.code_formats().peek(CodeType::Product).await.unwrap(), "PRD00001");
    }

    #[tokio::test]
    async fn test_failed_insert_burns_no_code() {
        let db = setup().await;
        let mut product = beans(1);
        product.category_id = Some(999);

        let err = db.products().create(&product).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(db.code_formats().peek(CodeType::Product).await.unwrap(), "PRD00001");
    }

    #[tokio::test]
    async fn test_invalid_fields_rejected() {
        let db = setup().await;
        let repo = db.products();

        let mut product = beans(-1);
        assert!(matches!(repo.create(&product).await.unwrap_err(), DbError::Validation(_)));

        product.quantity = 1;
        product.max_discount = 101;
        assert!(matches!(repo.create(&product).await.unwrap_err(), DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_by_sku() {
        let db = setup().await;
        let repo = db.products();
        let created = repo.create(&beans(3)).await.unwrap();

        let mut changes = beans(7);
        changes.name = "House Blend 1kg".to_string();
        changes.max_discount = 0;
        let updated = repo.update(&created.sku, &changes).await.unwrap();
        assert_eq!(updated.name, "House Blend 1kg");
        assert_eq!(updated.quantity, 7);
        assert!(!updated.discount_allowed());

        repo.delete(&created.sku).await.unwrap();
        assert!(matches!(
            repo.get_by_sku(&created.sku).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            repo.update(&created.sku, &changes).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_search() {
        let db = setup().await;
        let repo = db.products();
        repo.create(&beans(1)).await.unwrap();
        let mut tea = beans(1);
        tea.name = "Green Tea 100% leaf".to_string();
        repo.create(&tea).await.unwrap();

        assert_eq!(repo.search("espresso", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("PRD0000", 10).await.unwrap().len(), 2);
        assert_eq!(repo.search("100%", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("", 1).await.unwrap().len(), 1);
        assert!(repo.search("nothing", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restock() {
        let db = setup().await;
        let repo = db.products();
        let created = repo.create(&beans(2)).await.unwrap();

        let restocked = repo.restock(&created.sku, 8).await.unwrap();
        assert_eq!(restocked.quantity, 10);
        assert!(repo.restock(&created.sku, 0).await.is_err());
        assert!(matches!(
            repo.restock("PRD99999", 1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_deduct_four_three_times_from_ten() {
        let db = setup().await;
        let repo = db.products();
        let sku = repo.create(&beans(10)).await.unwrap().sku;

        repo.deduct_stock(&[deduction(&sku, 4)]).await.unwrap();
        repo.deduct_stock(&[deduction(&sku, 4)]).await.unwrap();
        let err = repo.deduct_stock(&[deduction(&sku, 4)]).await.unwrap_err();

        assert!(matches!(err, DbError::InsufficientStock { sku: ref s, requested: 4 } if *s == sku));
        assert_eq!(repo.get_by_sku(&sku).await.unwrap().quantity, 2);
    }

    #[tokio::test]
    async fn test_deduct_batch_is_all_or_nothing() {
        let db = setup().await;
        let repo = db.products();
        let a = repo.create(&beans(10)).await.unwrap().sku;
        let b = repo.create(&beans(1)).await.unwrap().sku;

        let err = repo
            .deduct_stock(&[deduction(&a, 5), deduction(&b, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { .. }));
        assert_eq!(repo.get_by_sku(&a).await.unwrap().quantity, 10);
        assert_eq!(repo.get_by_sku(&b).await.unwrap().quantity, 1);

        let err = repo
            .deduct_stock(&[deduction(&a, 5), deduction("PRD99999", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(repo.get_by_sku(&a).await.unwrap().quantity, 10);

        repo.deduct_stock(&[deduction(&a, 5), deduction(&b, 1)]).await.unwrap();
        assert_eq!(repo.get_by_sku(&a).await.unwrap().quantity, 5);
        assert_eq!(repo.get_by_sku(&b).await.unwrap().quantity, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deductions_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stock.db")).max_connections(8))
            .await
            .unwrap();
        let sku = db.products().create(&beans(100)).await.unwrap().sku;

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = db.products();
            let sku = sku.clone();
            handles.push(tokio::spawn(async move {
                repo.deduct_stock(&[deduction(&sku, 3)]).await
            }));
        }

        let (mut ok, mut insufficient) = (0, 0);
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(DbError::InsufficientStock { .. }) => insufficient += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        // 33 × 3 = 99 of 100
        assert_eq!(ok, 33);
        assert_eq!(insufficient, 17);
        assert_eq!(db.products().get_by_sku(&sku).await.unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_deduct_rejects_bad_input() {
        let db = setup().await;
        let repo = db.products();

        assert!(matches!(repo.deduct_stock(&[]).await.unwrap_err(), DbError::Validation(_)));
        assert!(matches!(
            repo.deduct_stock(&[deduction("PRD00001", 0)]).await.unwrap_err(),
            DbError::Validation(_)
        ));
    }
}
