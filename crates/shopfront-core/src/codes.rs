//! # Entry Codes
//!
//! Human-readable business identifiers: SKUs, supplier codes, customer
//! codes, purchase-order codes and invoice codes.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  codeformats row                      generated code                    │
//! │  ─────────────────────────────        ──────────────────                │
//! │  code_type  = 4 (PurchaseOrder)                                         │
//! │  prefix     = "PO"            ──►     "PO" + "000042" = "PO000042"      │
//! │  pad_length = 6                                                         │
//! │  next_value = 42                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter lives in the database (see `shopfront-db`); this module only
//! knows how to name a code type and how to render a counter value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Code Type
// =============================================================================

/// The kind of entity an entry code identifies.
///
/// Stored as a small integer in `codeformats.code_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CodeType {
    Product,
    Supplier,
    Customer,
    PurchaseOrder,
    Invoice,
}

impl CodeType {
    /// All code types, in storage order.
    pub const ALL: [CodeType; 5] = [
        CodeType::Product,
        CodeType::Supplier,
        CodeType::Customer,
        CodeType::PurchaseOrder,
        CodeType::Invoice,
    ];

    /// Storage key in `codeformats.code_type`.
    #[inline]
    pub const fn id(&self) -> i64 {
        match self {
            CodeType::Product => 1,
            CodeType::Supplier => 2,
            CodeType::Customer => 3,
            CodeType::PurchaseOrder => 4,
            CodeType::Invoice => 5,
        }
    }

    /// Inverse of [`CodeType::id`].
    pub fn from_id(id: i64) -> Option<Self> {
        CodeType::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Slug used in URLs and logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CodeType::Product => "product",
            CodeType::Supplier => "supplier",
            CodeType::Customer => "customer",
            CodeType::PurchaseOrder => "purchase_order",
            CodeType::Invoice => "invoice",
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodeType {
    type Err = ValidationError;

    /// Accepts the slug, the kebab-case form, or the numeric id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");

        if let Ok(id) = normalized.parse::<i64>() {
            if let Some(code_type) = CodeType::from_id(id) {
                return Ok(code_type);
            }
        }

        CodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "code type".to_string(),
                allowed: CodeType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Renders `prefix + value` with the value zero-padded to `pad_length` digits.
///
/// ## Overflow
/// A value with more digits than `pad_length` is never truncated: the code
/// simply grows wider. Truncation would hand out a code that was already
/// issued; see [`exceeds_width`] for detecting the case.
///
/// ## Example
/// ```rust
/// use shopfront_core::codes::format_code;
///
/// assert_eq!(format_code("SUP", 4, 7), "SUP0007");
/// assert_eq!(format_code("SUP", 4, 12345), "SUP12345");
/// ```
pub fn format_code(prefix: &str, pad_length: usize, value: i64) -> String {
    format!("{}{:0width$}", prefix, value, width = pad_length)
}

/// True when `value` needs more than `pad_length` digits.
pub fn exceeds_width(pad_length: usize, value: i64) -> bool {
    digit_count(value) > pad_length
}

fn digit_count(value: i64) -> usize {
    value.unsigned_abs().checked_ilog10().map_or(1, |d| d as usize + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_width() {
        assert_eq!(format_code("PO", 6, 1), "PO000001");
        assert_eq!(format_code("INV", 6, 999_999), "INV999999");
        assert_eq!(format_code("", 3, 5), "005");
    }

    #[test]
    fn test_format_widens_on_overflow() {
        assert_eq!(format_code("CUS", 4, 10_000), "CUS10000");
        assert!(exceeds_width(4, 10_000));
        assert!(!exceeds_width(4, 9_999));
        assert!(!exceeds_width(1, 0));
    }

    #[test]
    fn test_code_type_ids_roundtrip() {
        for code_type in CodeType::ALL {
            assert_eq!(CodeType::from_id(code_type.id()), Some(code_type));
        }
        assert_eq!(CodeType::from_id(0), None);
    }

    #[test]
    fn test_code_type_parse() {
        assert_eq!("purchase-order".parse::<CodeType>().unwrap(), CodeType::PurchaseOrder);
        assert_eq!("INVOICE".parse::<CodeType>().unwrap(), CodeType::Invoice);
        assert_eq!("2".parse::<CodeType>().unwrap(), CodeType::Supplier);
        assert!("widget".parse::<CodeType>().is_err());
    }
}
