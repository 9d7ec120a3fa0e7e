//! # Error Types
//!
//! Domain-specific error types for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  comanda-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  comanda-db errors (separate crate)                                 │
//! │  └── DbError          - Persistence failures, lock conflicts        │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → web layer message    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, shortfall, ...)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to a distinct user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by settlement and promotion logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Settlement attempted on an order that is already paid.
    #[error("Order {0} is already paid")]
    OrderAlreadyPaid(String),

    /// The order's status does not allow the requested operation
    /// (e.g. settling a cancelled order, submitting an already-cooking
    /// order to the kitchen).
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// A promo code was supplied for an order that already carries a
    /// promotion. Rejected before any lock or computation; no transaction
    /// record is written.
    #[error("Order {order_id} already has promotion {existing} applied")]
    DuplicatePromotion {
        order_id: String,
        existing: String,
    },

    /// Cash tendered is less than the amount due. Recorded as a Failed
    /// transaction and surfaced with the shortfall.
    ///
    /// The web layer renders this as "payment insufficient, owe {short_by}
    /// more".
    #[error("Insufficient payment: owe {short_by} more")]
    InsufficientPayment { short_by: Money },

    /// An order with no lines cannot be submitted or settled.
    #[error("Order {0} has no line items")]
    EmptyOrder(String),

    /// Order has exceeded the maximum number of distinct lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// CSV rendering failed. In practice only reachable through a broken
    /// writer, since exports render into memory.
    #[error("Export failed: {0}")]
    Export(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (bad characters, malformed date, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date range where the start falls after the end.
    #[error("start date cannot be after end date")]
    InvertedDateRange,

    /// A report date range wider than the allowed maximum.
    #[error("date range too large: limit is {max_days} days")]
    DateRangeTooLarge { max_days: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientPayment {
            short_by: Money::from_cents(1_000),
        };
        assert_eq!(err.to_string(), "Insufficient payment: owe $10.00 more");

        let err = CoreError::DuplicatePromotion {
            order_id: "o-1".to_string(),
            existing: "SAVE20".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Order o-1 already has promotion SAVE20 applied"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "code".to_string(),
        };
        assert_eq!(err.to_string(), "code is required");

        let err = ValidationError::DateRangeTooLarge { max_days: 366 };
        assert_eq!(err.to_string(), "date range too large: limit is 366 days");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::InvertedDateRange;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
