//! # Error Types
//!
//! Domain-specific error types for shopfront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopfront-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopfront-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What the HTTP client sees (status + JSON)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document (invoice, purchase order) was submitted without lines
    /// where lines are mandatory.
    #[error("{document} must contain at least one line")]
    EmptyDocument { document: String },

    /// A document carries more lines than a single write allows.
    #[error("{document} cannot have more than {max} lines")]
    TooManyLines { document: String, max: usize },

    /// Recorded totals do not match the sum of the lines.
    ///
    /// ## When This Occurs
    /// ```text
    /// Invoice total: 1500
    /// Σ price × qty: 1499
    ///      │
    ///      ▼
    /// TotalsMismatch { field: "total", expected: 1499, actual: 1500 }
    /// ```
    #[error("{field} does not match line items: expected {expected}, got {actual}")]
    TotalsMismatch {
        field: String,
        expected: i64,
        actual: i64,
    },

    /// A line discount exceeds the line amount.
    #[error("Discount on {sku} exceeds the line amount")]
    DiscountExceedsLine { sku: String },

    /// A line discount is above what the product allows.
    #[error("Discount on {sku} exceeds the allowed {max_cents} cents")]
    DiscountNotAllowed { sku: String, max_cents: i64 },

    /// An amount computed from client input does not fit in an i64.
    #[error("{field} is too large")]
    AmountOverflow { field: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything touches the database.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid email, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
