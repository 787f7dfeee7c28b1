//! # Purchase Order Repository
//!
//! Purchase orders and their lines, written as one unit.
//!
//! ## Composite Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create(order)                                        │
//! │                                                                         │
//! │  validate_purchase_order(lines, total)      ← no DB access yet          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── UPDATE codeformats ... RETURNING      → "PO000007"               │
//! │   ├── INSERT purchaseorder                  (FK → suppliers)           │
//! │   └── INSERT purchaseorderdetails VALUES (..), (..), (..)              │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: no order, no lines,    │
//! │  and the counter is back where it was.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//! `open` → `received` via [`PurchaseOrderRepository::receive`], which books
//! the line quantities into product stock. Received orders cannot be
//! deleted.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopfront_core::validation::{validate_code, validate_purchase_order};
use shopfront_core::{
    CodeType, Money, NewPurchaseOrderLine, PurchaseOrder, PurchaseOrderLine, PurchaseOrderStatus,
    PurchaseOrderWithLines,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::code_format::generate_in;

const ORDER_COLUMNS: &str =
    "id, order_code, supplier_code, post_date, doc_date, total_cost_cents, status, created_at";

const LINE_COLUMNS: &str =
    "id, order_code, sku, product_name, quantity, unit_cost_cents, line_total_cents";

/// A purchase order as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrder {
    pub supplier_code: String,
    #[serde(default)]
    pub lines: Vec<NewPurchaseOrderLine>,
    pub total_cost_cents: i64,
}

/// Identity of a newly written purchase order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPurchaseOrder {
    pub id: i64,
    pub order_code: String,
}

/// Repository for purchase orders.
#[derive(Debug, Clone)]
pub struct PurchaseOrderRepository {
    pool: SqlitePool,
}

impl PurchaseOrderRepository {
    /// Creates a new PurchaseOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseOrderRepository { pool }
    }

    /// Writes an order and all of its lines atomically.
    ///
    /// Post date and document date are both today (UTC).
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - bad line or totals mismatch
    /// * `Err(DbError::NotFound)` - unknown supplier
    pub async fn create(&self, order: &NewPurchaseOrder) -> DbResult<CreatedPurchaseOrder> {
        validate_code("supplier code", &order.supplier_code)?;
        let total = validate_purchase_order(&order.lines, Money::from_cents(order.total_cost_cents))?;
        let supplier_code = order.supplier_code.trim();

        let mut tx = self.pool.begin().await?;

        // The counter bump takes the write lock; checks come after it.
        let order_code = generate_in(&mut tx, CodeType::PurchaseOrder).await?;

        let supplier_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM suppliers WHERE supplier_code = ?1)")
                .bind(supplier_code)
                .fetch_one(&mut *tx)
                .await?;
        if !supplier_exists {
            return Err(DbError::not_found("Supplier", supplier_code));
        }
        let today = Utc::now().date_naive();

        debug!(
            order_code = %order_code,
            supplier_code = %order.supplier_code,
            lines = order.lines.len(),
            "Inserting purchase order"
        );

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO purchaseorder (
                order_code, supplier_code, post_date, doc_date,
                total_cost_cents, status, created_at
            ) VALUES (?1, ?2, ?3, ?3, ?4, ?5, ?6)
            RETURNING id
            "#,
        )
        .bind(&order_code)
        .bind(supplier_code)
        .bind(today)
        .bind(total.cents())
        .bind(PurchaseOrderStatus::Open)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        if !order.lines.is_empty() {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO purchaseorderdetails \
                 (order_code, sku, product_name, quantity, unit_cost_cents, line_total_cents) ",
            );
            builder.push_values(&order.lines, |mut row, line| {
                row.push_bind(order_code.clone())
                    .push_bind(line.sku.trim().to_string())
                    .push_bind(line.product_name.trim().to_string())
                    .push_bind(line.quantity)
                    .push_bind(line.unit_cost_cents)
                    .push_bind(line.line_total().cents());
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!(order_code = %order_code, lines = order.lines.len(), "Purchase order created");
        Ok(CreatedPurchaseOrder { id, order_code })
    }

    /// Gets an order with its lines.
    pub async fn get(&self, order_code: &str) -> DbResult<PurchaseOrderWithLines> {
        let order = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchaseorder WHERE order_code = ?1"
        ))
        .bind(order_code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase order", order_code))?;

        let lines = self.lines(order_code).await?;
        Ok(PurchaseOrderWithLines { order, lines })
    }

    /// Lists order headers, newest first.
    pub async fn list(&self) -> DbResult<Vec<PurchaseOrder>> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(&format!(
            "SELECT {ORDER_COLUMNS} FROM purchaseorder ORDER BY post_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Lines of an order in insertion order. Empty for unknown codes.
    pub async fn lines(&self, order_code: &str) -> DbResult<Vec<PurchaseOrderLine>> {
        let lines = sqlx::query_as::<_, PurchaseOrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM purchaseorderdetails WHERE order_code = ?1 ORDER BY id"
        ))
        .bind(order_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Deletes an open order together with its lines.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such order (deleted lines are restored)
    /// * `Err(DbError::InvalidState)` - order already received
    pub async fn delete(&self, order_code: &str) -> DbResult<()> {
        debug!(order_code = %order_code, "Deleting purchase order");

        let mut tx = self.pool.begin().await?;

        // Lines first: the header is the FK target.
        let lines = sqlx::query("DELETE FROM purchaseorderdetails WHERE order_code = ?1")
            .bind(order_code)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let status: Option<PurchaseOrderStatus> =
            sqlx::query_scalar("DELETE FROM purchaseorder WHERE order_code = ?1 RETURNING status")
                .bind(order_code)
                .fetch_optional(&mut *tx)
                .await?;

        match status {
            None => return Err(DbError::not_found("Purchase order", order_code)),
            Some(PurchaseOrderStatus::Received) => {
                return Err(DbError::invalid_state(
                    "Purchase order",
                    order_code,
                    "already received",
                ))
            }
            Some(PurchaseOrderStatus::Open) => {}
        }

        tx.commit().await?;

        info!(order_code = %order_code, lines, "Purchase order deleted");
        Ok(())
    }

    /// Marks an open order received and adds every line quantity to the
    /// matching product's stock, all in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidState)` - already received
    /// * `Err(DbError::NotFound)` - unknown order, or a line's SKU has no
    ///   product (nothing is booked)
    pub async fn receive(&self, order_code: &str) -> DbResult<PurchaseOrderWithLines> {
        debug!(order_code = %order_code, "Receiving purchase order");

        let mut tx = self.pool.begin().await?;

        let flipped: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE purchaseorder SET status = ?1
            WHERE order_code = ?2 AND status = ?3
            RETURNING id
            "#,
        )
        .bind(PurchaseOrderStatus::Received)
        .bind(order_code)
        .bind(PurchaseOrderStatus::Open)
        .fetch_optional(&mut *tx)
        .await?;

        if flipped.is_none() {
            let exists: Option<i64> =
                sqlx::query_scalar("SELECT id FROM purchaseorder WHERE order_code = ?1")
                    .bind(order_code)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Err(match exists {
                Some(_) => DbError::invalid_state("Purchase order", order_code, "already received"),
                None => DbError::not_found("Purchase order", order_code),
            });
        }

        let lines = sqlx::query_as::<_, PurchaseOrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM purchaseorderdetails WHERE order_code = ?1 ORDER BY id"
        ))
        .bind(order_code)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();
        for line in &lines {
            let result = sqlx::query(
                "UPDATE products SET quantity = quantity + ?1, updated_at = ?2 WHERE sku = ?3",
            )
            .bind(line.quantity)
            .bind(now)
            .bind(&line.sku)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", &line.sku));
            }
        }

        tx.commit().await?;

        info!(order_code = %order_code, lines = lines.len(), "Purchase order received");
        self.get(order_code).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;
    use shopfront_core::PartyDetails;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let supplier = db
            .suppliers()
            .create(&PartyDetails {
                name: "Hill Roastery".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, supplier.supplier_code)
    }

    async fn product(db: &Database, quantity: i64) -> String {
        db.products()
            .create(&NewProduct {
                sku: None,
                name: "Espresso Beans 1kg".to_string(),
                category_id: None,
                quantity,
                cost_cents: 1200,
                price_cents: 2000,
                max_discount: 0,
            })
            .await
            .unwrap()
            .sku
    }

    fn line(sku: &str, quantity: i64, unit_cost: i64) -> NewPurchaseOrderLine {
        NewPurchaseOrderLine {
            sku: sku.to_string(),
            product_name: format!("Item {}", sku),
            quantity,
            unit_cost_cents: unit_cost,
        }
    }

    fn order(supplier_code: &str, lines: Vec<NewPurchaseOrderLine>) -> NewPurchaseOrder {
        let total = lines.iter().map(NewPurchaseOrderLine::line_total).sum::<Money>();
        NewPurchaseOrder {
            supplier_code: supplier_code.to_string(),
            lines,
            total_cost_cents: total.cents(),
        }
    }

    #[tokio::test]
    async fn test_create_writes_all_lines() {
        let (db, supplier) = setup().await;
        let repo = db.purchase_orders();

        let lines = vec![line("PRD00001", 2, 1200), line("PRD00002", 1, 500), line("PRD00003", 10, 75)];
        let created = repo.create(&order(&supplier, lines)).await.unwrap();
        assert_eq!(created.order_code, "PO000001");

        let fetched = repo.get(&created.order_code).await.unwrap();
        assert_eq!(fetched.lines.len(), 3);
        assert!(fetched.lines.iter().all(|l| l.order_code == created.order_code));
        assert_eq!(fetched.order.total_cost_cents, 2400 + 500 + 750);
        assert_eq!(fetched.order.status, PurchaseOrderStatus::Open);
        assert_eq!(fetched.order.post_date, fetched.order.doc_date);
        assert_eq!(fetched.lines[2].line_total_cents, 750);
    }

    #[tokio::test]
    async fn test_order_without_lines_allowed() {
        let (db, supplier) = setup().await;
        let created = db
            .purchase_orders()
            .create(&NewPurchaseOrder {
                supplier_code: supplier,
                lines: vec![],
                total_cost_cents: 0,
            })
            .await
            .unwrap();

        assert!(db.purchase_orders().lines(&created.order_code).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_supplier_is_not_found() {
        let (db, _) = setup().await;
        let repo = db.purchase_orders();

        let err = repo
            .create(&order("SUP9999", vec![line("PRD00001", 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Supplier"));

        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.lines("PO000001").await.unwrap().is_empty());
        assert_eq!(
            db.code_formats().peek(CodeType::PurchaseOrder).await.unwrap(),
            "PO000001"
        );
    }

    #[tokio::test]
    async fn test_total_mismatch_rejected() {
        let (db, supplier) = setup().await;
        let mut bad = order(&supplier, vec![line("PRD00001", 2, 100)]);
        bad.total_cost_cents = 199;

        let err = db.purchase_orders().create(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_lines() {
        let (db, supplier) = setup().await;
        let repo = db.purchase_orders();
        let created = repo
            .create(&order(&supplier, vec![line("PRD00001", 1, 100), line("PRD00002", 1, 100)]))
            .await
            .unwrap();

        repo.delete(&created.order_code).await.unwrap();

        assert!(repo.lines(&created.order_code).await.unwrap().is_empty());
        assert!(matches!(
            repo.get(&created.order_code).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            repo.delete(&created.order_code).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_supplier_with_orders_cannot_be_deleted() {
        let (db, supplier) = setup().await;
        db.purchase_orders()
            .create(&order(&supplier, vec![line("PRD00001", 1, 100)]))
            .await
            .unwrap();

        let err = db.suppliers().delete(&supplier).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_receive_books_stock_once() {
        let (db, supplier) = setup().await;
        let sku = product(&db, 3).await;
        let repo = db.purchase_orders();
        let created = repo
            .create(&order(&supplier, vec![line(&sku, 5, 1200), line(&sku, 2, 1200)]))
            .await
            .unwrap();

        let received = repo.receive(&created.order_code).await.unwrap();
        assert_eq!(received.order.status, PurchaseOrderStatus::Received);
        assert_eq!(db.products().get_by_sku(&sku).await.unwrap().quantity, 10);

        let err = repo.receive(&created.order_code).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
        assert_eq!(db.products().get_by_sku(&sku).await.unwrap().quantity, 10);

        let err = repo.delete(&created.order_code).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidState { .. }));
        assert_eq!(repo.lines(&created.order_code).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_receive_with_unknown_product_changes_nothing() {
        let (db, supplier) = setup().await;
        let sku = product(&db, 1).await;
        let repo = db.purchase_orders();
        let created = repo
            .create(&order(&supplier, vec![line(&sku, 4, 100), line("PRD99999", 1, 100)]))
            .await
            .unwrap();

        let err = repo.receive(&created.order_code).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let fetched = repo.get(&created.order_code).await.unwrap();
        assert_eq!(fetched.order.status, PurchaseOrderStatus::Open);
        assert_eq!(db.products().get_by_sku(&sku).await.unwrap().quantity, 1);
    }
}
