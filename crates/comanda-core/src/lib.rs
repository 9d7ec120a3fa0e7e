//! # comanda-core: Pure Business Logic for Comanda
//!
//! This crate is the heart of the Comanda point-of-sale system. It contains
//! the settlement and promotion rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Comanda Architecture                           │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │              Web Layer (external collaborator)              │   │
//! │  │    table map ──► cart ──► checkout ──► reports/exports      │   │
//! │  └──────────────────────────┬──────────────────────────────────┘   │
//! │                             │                                       │
//! │  ┌──────────────────────────▼──────────────────────────────────┐   │
//! │  │             ★ comanda-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │  ┌─────────┐ ┌───────────┐ ┌────────────┐ ┌────────────┐   │   │
//! │  │  │  types  │ │   money   │ │ promotion  │ │ settlement │   │   │
//! │  │  │ Order   │ │   Money   │ │ evaluator  │ │   Quote    │   │   │
//! │  │  │ Invoice │ │ bps math  │ │ eligibility│ │   tender   │   │   │
//! │  │  └─────────┘ └───────────┘ └────────────┘ └────────────┘   │   │
//! │  │                                                             │   │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS         │   │
//! │  └──────────────────────────┬──────────────────────────────────┘   │
//! │                             │                                       │
//! │  ┌──────────────────────────▼──────────────────────────────────┐   │
//! │  │                 comanda-db (Database Layer)                 │   │
//! │  │       SQLite repositories, settlement + report services     │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Order, Promotion, Invoice, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`promotion`] - Promotion eligibility and discount evaluation
//! - [`settlement`] - Settlement quotes and tender validation
//! - [`report`] - Report row types and CSV rendering
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), never floats
//! 4. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod promotion;
pub mod report;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fixed page size for report drill-down queries.
///
/// Drill-down returns the raw orders behind an aggregate row; the page size
/// is fixed rather than caller-supplied to bound result size.
pub const REPORT_PAGE_SIZE: u32 = 50;

/// Maximum report date range, in days.
///
/// Wider ranges are rejected up front rather than aggregated slowly.
pub const MAX_REPORT_RANGE_DAYS: i64 = 366;

/// Maximum distinct lines allowed on a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
