//! # Repository Module
//!
//! Database repository implementations for Shopfront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.purchase_orders().create(order)                            │
//! │       ▼                                                                 │
//! │  PurchaseOrderRepository                                               │
//! │  ├── validate (shopfront-core)       ← before any write                │
//! │  ├── pool.begin()                                                      │
//! │  ├── code_format::generate_in(&mut tx)                                 │
//! │  ├── INSERT purchaseorder / purchaseorderdetails                       │
//! │  └── tx.commit()                     ← drop without commit = rollback  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`code_format::CodeFormatRepository`] - Entry code generation
//! - [`user::UserRepository`] - Users and roles
//! - [`category::CategoryRepository`] - Product categories
//! - [`product::ProductRepository`] - Catalog and stock
//! - [`party::SupplierRepository`], [`party::CustomerRepository`]
//! - [`purchase_order::PurchaseOrderRepository`] - Orders + lines
//! - [`invoice::InvoiceRepository`] - Invoices + cart items
//! - [`report::ReportRepository`] - Read-only aggregates

pub mod category;
pub mod code_format;
pub mod invoice;
pub mod party;
pub mod product;
pub mod purchase_order;
pub mod report;
pub mod user;
