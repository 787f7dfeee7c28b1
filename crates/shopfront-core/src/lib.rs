//! # shopfront-core: Pure Business Logic for Shopfront
//!
//! This crate holds the retail back-office rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Client                                   │   │
//! │  │    Catalog ──► Purchasing ──► Invoicing ──► Reports             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum handlers)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopfront-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   codes   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CodeType  │  │   rules   │  │   │
//! │  │   │  Invoice  │  │           │  │format_code│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopfront-db (Database Layer)                   │   │
//! │  │      SQLite queries, code generator, composite writers          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Supplier, PurchaseOrder, Invoice, etc.)
//! - [`codes`] - Entry code types and formatting (`PO000042`)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::codes::format_code;
//! use shopfront_core::money::Money;
//!
//! assert_eq!(format_code("INV", 6, 42), "INV000042");
//!
//! let line = Money::from_cents(1099).multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codes;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use codes::{format_code, CodeType};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single invoice or purchase order.
///
/// ## Business Reason
/// Keeps a single composite write bounded; larger documents are split.
pub const MAX_DOCUMENT_LINES: usize = 500;

/// Maximum quantity on a single line.
pub const MAX_LINE_QUANTITY: i64 = 100_000;

/// Largest single amount accepted from a client, in cents ($1,000,000,000).
///
/// At this bound a full document (500 lines of 100,000 units) still sums
/// inside an i64.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// Upper bound for a product's maximum discount, in percent.
pub const MAX_DISCOUNT_PERCENT: i64 = 100;
