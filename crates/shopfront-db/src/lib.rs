//! # shopfront-db: Database Layer for Shopfront
//!
//! This crate provides database access for Shopfront.
//! It uses SQLite through sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/invoices)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   shopfront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │  │   │
//! │  │   │               │    │ CodeFormatRepo │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │   │ 001_init.sql │  │   │
//! │  │   │ + fallback    │    │ PurchaseOrder… │   │              │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, primary/fallback startup
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopfront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./shopfront.db")).await?;
//! let code = db.code_formats().generate(CodeType::Invoice).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{ConnectionOrigin, Database, DbConfig, RetryPolicy};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::code_format::CodeFormatRepository;
pub use repository::invoice::{InvoiceRepository, NewInvoice};
pub use repository::party::{CustomerRepository, SupplierRepository};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::purchase_order::{CreatedPurchaseOrder, NewPurchaseOrder, PurchaseOrderRepository};
pub use repository::report::ReportRepository;
pub use repository::user::{NewUser, UserRepository};
