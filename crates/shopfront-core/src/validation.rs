//! # Validation Module
//!
//! Input validation and document reconciliation for Shopfront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (serde)                                         │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (lengths, ranges, formats)                            │
//! │  └── Document rules (line counts, totals reconcile)                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints on business codes                              │
//! │  └── FOREIGN KEY constraints on code-keyed children                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopfront_core::validation::{validate_name, validate_quantity};
//!
//! validate_name("name", "Espresso Beans 1kg", 200).unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{NewCartItem, NewPurchaseOrderLine, StockDeduction};
use crate::{MAX_AMOUNT_CENTS, MAX_DISCOUNT_PERCENT, MAX_DOCUMENT_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display string (product name, supplier name, ...).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most `max` characters
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a business code supplied by a client (SKU, order code, ...).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use shopfront_core::validation::validate_code;
///
/// assert!(validate_code("sku", "PRD00042").is_ok());
/// assert!(validate_code("sku", "").is_err());
/// assert!(validate_code("sku", "has space").is_err());
/// ```
pub fn validate_code(field: &str, code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates an optional e-mail address (shape only).
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        });
    }

    Ok(())
}

/// Validates a login name: 3-32 characters, letters, digits, `.`, `_`, `-`.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }
    if username.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "username".to_string(),
            min: 3,
        });
    }
    if username.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 32,
        });
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '.', '_' and '-'".to_string(),
        });
    }

    Ok(())
}

/// Validates a new password. Minimum 8 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level (zero allowed).
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates an amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - Must not exceed MAX_AMOUNT_CENTS
///
/// ## Example
/// ```rust
/// use shopfront_core::validation::validate_amount_cents;
///
/// assert!(validate_amount_cents("price", 1099).is_ok());
/// assert!(validate_amount_cents("price", 0).is_ok());
/// assert!(validate_amount_cents("price", -100).is_err());
/// assert!(validate_amount_cents("price", i64::MAX).is_err());
/// ```
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }

    Ok(())
}

/// Validates a maximum discount percentage (0-100 inclusive).
pub fn validate_max_discount(percent: i64) -> ValidationResult<()> {
    if !(0..=MAX_DISCOUNT_PERCENT).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "max discount".to_string(),
            min: 0,
            max: MAX_DISCOUNT_PERCENT,
        });
    }
    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// `unit × quantity` for one line, checked.
fn line_amount(field: &str, unit_cents: i64, quantity: i64) -> CoreResult<Money> {
    Money::from_cents(unit_cents)
        .checked_multiply_quantity(quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            field: field.to_string(),
        })
}

fn checked_sum(field: &str, amounts: impl IntoIterator<Item = Money>) -> CoreResult<Money> {
    Money::checked_sum(amounts).ok_or_else(|| CoreError::AmountOverflow {
        field: field.to_string(),
    })
}

fn validate_line_count(document: &str, count: usize) -> CoreResult<()> {
    if count > MAX_DOCUMENT_LINES {
        return Err(CoreError::TooManyLines {
            document: document.to_string(),
            max: MAX_DOCUMENT_LINES,
        });
    }
    Ok(())
}

/// Validates purchase order lines against the submitted total cost.
///
/// ## Rules
/// - Lines are optional; an order may be raised empty and filled later
/// - Each line: code-shaped SKU, name, positive quantity, non-negative cost
/// - With lines present, `total_cost` must equal Σ unit cost × quantity
/// - Without lines, `total_cost` is checked like any other amount
///
/// Returns the reconciled total.
pub fn validate_purchase_order(
    lines: &[NewPurchaseOrderLine],
    total_cost: Money,
) -> CoreResult<Money> {
    validate_line_count("Purchase order", lines.len())?;

    if lines.is_empty() {
        validate_amount_cents("total cost", total_cost.cents())?;
        return Ok(total_cost);
    }

    let mut line_totals = Vec::with_capacity(lines.len());
    for line in lines {
        validate_code("sku", &line.sku)?;
        validate_name("product name", &line.product_name, 200)?;
        validate_quantity(line.quantity)?;
        validate_amount_cents("unit cost", line.unit_cost_cents)?;
        line_totals.push(line_amount("line total", line.unit_cost_cents, line.quantity)?);
    }

    let expected = checked_sum("total cost", line_totals)?;
    if expected != total_cost {
        return Err(CoreError::TotalsMismatch {
            field: "total cost".to_string(),
            expected: expected.cents(),
            actual: total_cost.cents(),
        });
    }

    Ok(expected)
}

/// Reconciles invoice totals with its cart items.
///
/// ## Rules
/// ```text
/// items.len() >= 1                       (empty invoices are rejected)
/// total    == Σ price × quantity
/// discount == Σ line discount            (absent discount counts as 0)
/// net      == total - discount
/// 0 <= line discount <= line amount
/// ```
pub fn reconcile_invoice(
    items: &[NewCartItem],
    total: Money,
    discount: Money,
    net: Money,
) -> CoreResult<()> {
    if items.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "Invoice".to_string(),
        });
    }
    validate_line_count("Invoice", items.len())?;

    let mut line_totals = Vec::with_capacity(items.len());
    for item in items {
        validate_code("sku", &item.sku)?;
        validate_name("item name", &item.name, 200)?;
        validate_quantity(item.quantity)?;
        validate_amount_cents("price", item.price_cents)?;
        validate_amount_cents("discount", item.discount().cents())?;
        let line_total = line_amount("line total", item.price_cents, item.quantity)?;
        if item.discount() > line_total {
            return Err(CoreError::DiscountExceedsLine {
                sku: item.sku.clone(),
            });
        }
        line_totals.push(line_total);
    }

    // Each discount is bounded by its line, so both sums share one bound.
    let expected_total = checked_sum("total", line_totals)?;
    let expected_discount = checked_sum("discount", items.iter().map(NewCartItem::discount))?;

    for (field, expected, actual) in [
        ("total", expected_total, total),
        ("discount", expected_discount, discount),
        ("net", expected_total - expected_discount, net),
    ] {
        if expected != actual {
            return Err(CoreError::TotalsMismatch {
                field: field.to_string(),
                expected: expected.cents(),
                actual: actual.cents(),
            });
        }
    }

    Ok(())
}

/// Validates a stock deduction batch before it reaches the database.
pub fn validate_deductions(entries: &[StockDeduction]) -> CoreResult<()> {
    if entries.is_empty() {
        return Err(CoreError::EmptyDocument {
            document: "Stock deduction".to_string(),
        });
    }
    validate_line_count("Stock deduction", entries.len())?;

    for entry in entries {
        validate_code("sku", &entry.sku)?;
        validate_quantity(entry.quantity)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
