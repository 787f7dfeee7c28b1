//! # Report Repository
//!
//! Read-only aggregates for the back office dashboard. Every figure is
//! computed in SQL over integer cents; date ranges are inclusive on both
//! ends and compare `post_date`.

use chrono::NaiveDate;
use serde::Serialize;
use shopfront_core::Product;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Invoice totals over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub invoice_count: i64,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub net_cents: i64,
}

/// One row of the best-seller list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub sku: String,
    pub name: String,
    pub quantity_sold: i64,
    /// Σ (price × quantity - discount)
    pub revenue_cents: i64,
}

/// Stock valuation at cost and at selling price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryValue {
    pub product_count: i64,
    pub units: i64,
    pub cost_value_cents: i64,
    pub retail_value_cents: i64,
}

/// Purchase order totals over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub order_count: i64,
    pub received_count: i64,
    pub total_cost_cents: i64,
}

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    pub async fn sales_summary(&self, from: NaiveDate, to: NaiveDate) -> DbResult<SalesSummary> {
        debug!(%from, %to, "Sales summary");

        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT COUNT(*)                        AS invoice_count,
                   COALESCE(SUM(total_cents), 0)    AS total_cents,
                   COALESCE(SUM(discount_cents), 0) AS discount_cents,
                   COALESCE(SUM(net_cents), 0)      AS net_cents
            FROM sales_invoices
            WHERE post_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Best sellers by units sold across all invoices.
    pub async fn top_products(&self, limit: u32) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT sku,
                   MAX(name)                                           AS name,
                   SUM(quantity)                                       AS quantity_sold,
                   SUM(price_cents * quantity - discount_cents)        AS revenue_cents
            FROM cart_items
            GROUP BY sku
            ORDER BY quantity_sold DESC, revenue_cents DESC, sku
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Products with `quantity <= threshold`, emptiest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, category_id, quantity, cost_cents, price_cents,
                   max_discount, created_at, updated_at
            FROM products
            WHERE quantity <= ?1
            ORDER BY quantity, sku
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn inventory_value(&self) -> DbResult<InventoryValue> {
        let value = sqlx::query_as::<_, InventoryValue>(
            r#"
            SELECT COUNT(*)                                 AS product_count,
                   COALESCE(SUM(quantity), 0)               AS units,
                   COALESCE(SUM(quantity * cost_cents), 0)  AS cost_value_cents,
                   COALESCE(SUM(quantity * price_cents), 0) AS retail_value_cents
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    pub async fn purchase_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<PurchaseSummary> {
        debug!(%from, %to, "Purchase summary");

        let summary = sqlx::query_as::<_, PurchaseSummary>(
            r#"
            SELECT COUNT(*)                                          AS order_count,
                   COALESCE(SUM(status = 'received'), 0)             AS received_count,
                   COALESCE(SUM(total_cost_cents), 0)                AS total_cost_cents
            FROM purchaseorder
            WHERE post_date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
