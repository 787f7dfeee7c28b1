//! # Domain Types
//!
//! Core domain types used throughout Shopfront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  PurchaseOrder  │   │  SalesInvoice   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (code)     │   │  order_code     │   │  invoice_code   │       │
//! │  │  quantity       │   │  supplier_code  │   │  customer_code  │       │
//! │  │  max_discount   │   │  total_cost     │   │  total/net      │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │                                 │ 1..N                │ 1..N           │
//! │                        ┌────────┴──────────┐ ┌────────┴────────┐       │
//! │                        │ PurchaseOrderLine │ │    CartItem     │       │
//! │                        │  order_code (FK)  │ │ invoice_code(FK)│       │
//! │                        └───────────────────┘ └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: surrogate integer key assigned by the database
//! - Business code: (sku, order_code, invoice_code, ...) generated from
//!   `codeformats`, used by every lookup, update and child reference

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::codes::{format_code, CodeType};
use crate::money::Money;

// =============================================================================
// Code Format
// =============================================================================

/// A stored template governing the shape of generated codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CodeFormat {
    /// Storage key, see [`CodeType::id`].
    pub code_type: i64,
    pub description: String,
    pub prefix: String,
    pub pad_length: i64,
    /// Last value handed out. The next code uses `next_value + 1`.
    pub next_value: i64,
}

impl CodeFormat {
    /// The typed code kind, if the stored integer is known.
    pub fn kind(&self) -> Option<CodeType> {
        CodeType::from_id(self.code_type)
    }

    /// The code the next generation would produce.
    pub fn preview_next(&self) -> String {
        format_code(&self.prefix, self.pad_length.max(0) as usize, self.next_value + 1)
    }
}

// =============================================================================
// Users & Roles
// =============================================================================

/// A user role (`admin`, `manager`, `cashier`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Role name with full user management rights.
pub const ADMIN_ROLE: &str = "admin";

/// An application user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role_id: i64,
    /// Joined from `userroles.name`.
    pub role_name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role_name == ADMIN_ROLE
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,

    /// Stock Keeping Unit, generated from the `product` code format.
    pub sku: String,

    pub name: String,

    pub category_id: Option<i64>,

    /// Units on hand. The database enforces `quantity >= 0`.
    pub quantity: i64,

    /// Purchase cost in cents.
    pub cost_cents: i64,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Maximum discount a cashier may grant, in percent (0-100).
    pub max_discount: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether a discount may be applied at all.
    ///
    /// True iff `0 < max_discount < 100`. A product at 100% is treated as
    /// misconfigured rather than free.
    #[inline]
    pub fn discount_allowed(&self) -> bool {
        discount_allowed(self.max_discount)
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Largest discount allowed on a line of `quantity` units.
    pub fn max_line_discount(&self, quantity: i64) -> Money {
        if !self.discount_allowed() {
            return Money::zero();
        }
        self.price().multiply_quantity(quantity).percent(self.max_discount)
    }
}

/// See [`Product::discount_allowed`].
#[inline]
pub fn discount_allowed(max_discount: i64) -> bool {
    max_discount > 0 && max_discount < 100
}

// =============================================================================
// Parties
// =============================================================================

/// A supplier we purchase from.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: i64,
    pub supplier_code: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A customer we invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub customer_code: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Contact details shared by supplier and customer writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetails {
    pub name: String,
    /// Ignored for customers.
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// =============================================================================
// Purchase Orders
// =============================================================================

/// Lifecycle of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    /// Ordered, stock not yet booked in.
    Open,
    /// Goods received and added to stock.
    Received,
}

impl Default for PurchaseOrderStatus {
    fn default() -> Self {
        PurchaseOrderStatus::Open
    }
}

/// A purchase order header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: i64,
    pub order_code: String,
    pub supplier_code: String,
    #[ts(as = "String")]
    pub post_date: NaiveDate,
    #[ts(as = "String")]
    pub doc_date: NaiveDate,
    pub total_cost_cents: i64,
    pub status: PurchaseOrderStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line on a purchase order, keyed by the order's code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub id: i64,
    pub order_code: String,
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
    pub line_total_cents: i64,
}

/// A line as submitted when creating a purchase order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewPurchaseOrderLine {
    pub sku: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

impl NewPurchaseOrderLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_cost_cents).multiply_quantity(self.quantity)
    }
}

/// A purchase order together with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderWithLines {
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub lines: Vec<PurchaseOrderLine>,
}

// =============================================================================
// Invoices
// =============================================================================

/// How an invoice was settled.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    /// Settled later; the invoice carries a due date.
    Credit,
}

/// A sales invoice header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesInvoice {
    pub id: i64,
    pub invoice_code: String,
    /// `None` for walk-in sales.
    pub customer_code: Option<String>,
    #[ts(as = "String")]
    pub post_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    /// Σ price × quantity.
    pub total_cents: i64,
    /// Σ line discounts.
    pub discount_cents: i64,
    /// total - discount.
    pub net_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A line on an invoice, keyed by the invoice's code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub invoice_code: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub discount_cents: i64,
}

/// A cart item as submitted when saving an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub price_cents: i64,
    /// Absolute discount on the line in cents. Defaults to 0.
    #[serde(default)]
    pub discount_cents: Option<i64>,
}

impl NewCartItem {
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents.unwrap_or(0))
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents).multiply_quantity(self.quantity)
    }
}

/// An invoice together with its cart items.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: SalesInvoice,
    pub items: Vec<CartItem>,
}

// =============================================================================
// Inventory
// =============================================================================

/// One entry of a stock deduction batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockDeduction {
    pub sku: String,
    pub quantity: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
