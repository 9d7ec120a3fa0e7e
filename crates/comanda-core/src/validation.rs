//! # Validation Module
//!
//! Input validation rules applied before business logic runs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Web layer (external)                                      │
//! │  └── Form/format checks, immediate feedback                         │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE - business rule validation                    │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  └── NOT NULL / UNIQUE / foreign key constraints                    │
//! │                                                                     │
//! │  Defense in depth: each layer catches different mistakes            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_REPORT_RANGE_DAYS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a promotion code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Alphanumeric, hyphens, underscores only
///
/// ## Example
/// ```rust
/// use comanda_core::validation::validate_promo_code;
///
/// assert!(validate_promo_code("SAVE20").is_ok());
/// assert!(validate_promo_code("").is_err());
/// assert!(validate_promo_code("TEN %OFF").is_err());
/// ```
pub fn validate_promo_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a dining table name (e.g. "T-01", "VIP-02").
pub fn validate_table_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "table name".to_string(),
        });
    }

    if name.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "table name".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a menu item name.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents (menu items cannot have negative prices).
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage discount expressed in basis points (0..=100%).
pub fn validate_discount_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=10_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Date Range Validator
// =============================================================================

/// Validates a report date range.
///
/// ## Rules
/// - `start <= end`
/// - Range at most [`MAX_REPORT_RANGE_DAYS`] days (aggregating an unbounded
///   range would overload the report queries)
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if start > end {
        return Err(ValidationError::InvertedDateRange);
    }

    if (end - start).num_days() > MAX_REPORT_RANGE_DAYS {
        return Err(ValidationError::DateRangeTooLarge {
            max_days: MAX_REPORT_RANGE_DAYS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promo_code_rules() {
        assert!(validate_promo_code("SAVE20").is_ok());
        assert!(validate_promo_code("summer_special-1").is_ok());
        assert!(validate_promo_code("").is_err());
        assert!(validate_promo_code("   ").is_err());
        assert!(validate_promo_code("HALF OFF").is_err());
        assert!(validate_promo_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_table_name_rules() {
        assert!(validate_table_name("T-01").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_quantity_rules() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_discount_bps_rules() {
        assert!(validate_discount_bps(0).is_ok());
        assert!(validate_discount_bps(10_000).is_ok());
        assert!(validate_discount_bps(-1).is_err());
        assert!(validate_discount_bps(10_001).is_err());
    }

    #[test]
    fn test_date_range_rules() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        assert!(validate_date_range(d(2026, 1, 1), d(2026, 1, 31)).is_ok());
        assert!(validate_date_range(d(2026, 1, 1), d(2026, 1, 1)).is_ok());
        assert!(validate_date_range(d(2026, 2, 1), d(2026, 1, 1)).is_err());
        // Just over a year
        assert!(validate_date_range(d(2024, 1, 1), d(2026, 1, 3)).is_err());
    }
}
