//! # Invoice Repository
//!
//! Sales invoices and their cart items, written as one unit.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reconcile_invoice(items, total, discount, net)   ← reject early       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── generate_in(Invoice)          → "INV000042"                      │
//! │   ├── customer exists?              (NotFound otherwise)               │
//! │   ├── discounted lines within product max_discount                     │
//! │   ├── INSERT sales_invoices         (FK → customers, nullable)         │
//! │   └── INSERT cart_items × N                                            │
//! │  COMMIT                              ← only after every insert         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Saving an invoice does not touch stock; callers deduct through
//! [`ProductRepository::deduct_stock`](crate::ProductRepository::deduct_stock).

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shopfront_core::validation::{reconcile_invoice, validate_code};
use shopfront_core::{
    CartItem, CodeType, CoreError, InvoiceWithItems, Money, NewCartItem, PaymentMethod, Product,
    SalesInvoice, ValidationError,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::code_format::generate_in;
use crate::repository::product::PRODUCT_COLUMNS;

const INVOICE_COLUMNS: &str = r#"
    id, invoice_code, customer_code, post_date, due_date, payment_method,
    total_cents, discount_cents, net_cents, created_at
"#;

const ITEM_COLUMNS: &str = "id, invoice_code, sku, name, quantity, price_cents, discount_cents";

/// An invoice as submitted from the till.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    /// `None` for walk-in sales.
    #[serde(default)]
    pub customer_code: Option<String>,
    /// Defaults to today (UTC).
    #[serde(default)]
    pub post_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    #[serde(default)]
    pub discount_cents: i64,
    pub net_cents: i64,
    pub items: Vec<NewCartItem>,
}

impl NewInvoice {
    fn validate(&self, post_date: NaiveDate) -> DbResult<()> {
        if let Some(code) = self.customer_code.as_deref() {
            validate_code("customer code", code)?;
        }

        match (self.payment_method, self.due_date) {
            (PaymentMethod::Credit, None) => {
                return Err(ValidationError::Required {
                    field: "due date".to_string(),
                }
                .into())
            }
            (_, Some(due)) if due < post_date => {
                return Err(ValidationError::InvalidFormat {
                    field: "due date".to_string(),
                    reason: "must not be before the post date".to_string(),
                }
                .into())
            }
            _ => {}
        }

        reconcile_invoice(
            &self.items,
            Money::from_cents(self.total_cents),
            Money::from_cents(self.discount_cents),
            Money::from_cents(self.net_cents),
        )?;
        Ok(())
    }
}

/// Repository for sales invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Saves an invoice with all of its cart items.
    ///
    /// ## Returns
    /// * `Ok(invoice_code)` - everything committed
    /// * `Err(DbError::Validation)` - no items, totals don't reconcile, bad
    ///   line, or a discount above the product's maximum
    /// * `Err(DbError::NotFound)` - unknown customer, or a discounted SKU
    ///   missing from the catalog
    pub async fn save(&self, invoice: &NewInvoice) -> DbResult<String> {
        let post_date = invoice.post_date.unwrap_or_else(|| Utc::now().date_naive());
        invoice.validate(post_date)?;
        let customer_code = invoice.customer_code.as_deref().map(str::trim);

        let mut tx = self.pool.begin().await?;

        // The counter bump takes the write lock; checks come after it.
        let invoice_code = generate_in(&mut tx, CodeType::Invoice).await?;

        if let Some(code) = customer_code {
            let customer_exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers WHERE customer_code = ?1)",
            )
            .bind(code)
            .fetch_one(&mut *tx)
            .await?;
            if !customer_exists {
                return Err(DbError::not_found("Customer", code));
            }
        }

        check_discounts(&mut tx, &invoice.items).await?;

        debug!(
            invoice_code = %invoice_code,
            items = invoice.items.len(),
            net_cents = invoice.net_cents,
            "Inserting invoice"
        );

        sqlx::query(
            r#"
            INSERT INTO sales_invoices (
                invoice_code, customer_code, post_date, due_date, payment_method,
                total_cents, discount_cents, net_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&invoice_code)
        .bind(customer_code)
        .bind(post_date)
        .bind(invoice.due_date)
        .bind(invoice.payment_method)
        .bind(invoice.total_cents)
        .bind(invoice.discount_cents)
        .bind(invoice.net_cents)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO cart_items \
             (invoice_code, sku, name, quantity, price_cents, discount_cents) ",
        );
        builder.push_values(&invoice.items, |mut row, item| {
            row.push_bind(invoice_code.clone())
                .push_bind(item.sku.trim().to_string())
                .push_bind(item.name.trim().to_string())
                .push_bind(item.quantity)
                .push_bind(item.price_cents)
                .push_bind(item.discount().cents());
        });
        builder.build().execute(&mut *tx).await?;

        tx.commit().await?;

        info!(
            invoice_code = %invoice_code,
            items = invoice.items.len(),
            "Invoice saved"
        );
        Ok(invoice_code)
    }

    /// Gets an invoice with its items.
    pub async fn get(&self, invoice_code: &str) -> DbResult<InvoiceWithItems> {
        let invoice = sqlx::query_as::<_, SalesInvoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM sales_invoices WHERE invoice_code = ?1"
        ))
        .bind(invoice_code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Invoice", invoice_code))?;

        let items = self.items(invoice_code).await?;
        Ok(InvoiceWithItems { invoice, items })
    }

    /// Lists invoice headers, newest first.
    pub async fn list(&self) -> DbResult<Vec<SalesInvoice>> {
        let invoices = sqlx::query_as::<_, SalesInvoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM sales_invoices ORDER BY post_date DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Items of an invoice in insertion order. Empty for unknown codes.
    pub async fn items(&self, invoice_code: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM cart_items WHERE invoice_code = ?1 ORDER BY id"
        ))
        .bind(invoice_code)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

/// Checks every discounted line against its product's `max_discount`.
/// Undiscounted lines may sell items outside the catalog.
async fn check_discounts(conn: &mut SqliteConnection, items: &[NewCartItem]) -> DbResult<()> {
    for item in items.iter().filter(|item| !item.discount().is_zero()) {
        let sku = item.sku.trim();
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Product", sku))?;

        let max = product.max_line_discount(item.quantity);
        if item.discount() > max {
            return Err(CoreError::DiscountNotAllowed {
                sku: sku.to_string(),
                max_cents: max.cents(),
            }
            .into());
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
