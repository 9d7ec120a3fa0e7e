//! # comanda-db: Database Layer for Comanda
//!
//! This crate provides database access for the Comanda point-of-sale
//! system. It uses SQLite for local storage with sqlx for async operations,
//! and hosts the two services that need transactional access: payment
//! settlement and report aggregation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Comanda Data Flow                             │
//! │                                                                     │
//! │  Web handler (checkout, reports)                                    │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                  comanda-db (THIS CRATE)                    │   │
//! │  │                                                             │   │
//! │  │  ┌────────────┐  ┌──────────────┐  ┌────────────────────┐  │   │
//! │  │  │  Database  │  │ Repositories │  │     Services       │  │   │
//! │  │  │ (pool.rs)  │  │ order, menu, │  │ SettlementService  │  │   │
//! │  │  │            │◄─│ promotion,   │  │ ReportService      │  │   │
//! │  │  │ SqlitePool │  │ table, waste,│  │ (tx boundary here) │  │   │
//! │  │  │            │  │ inventory    │  │                    │  │   │
//! │  │  └────────────┘  └──────────────┘  └────────────────────┘  │   │
//! │  │                                                             │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite database (WAL mode, embedded migrations)                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (order, menu, ...)
//! - [`settlement`] - The committing settlement service
//! - [`report`] - Report aggregation and export service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_db::{Database, DbConfig};
//! use comanda_core::{Money, PaymentMethod};
//!
//! let db = Database::new(DbConfig::new("path/to/comanda.db")).await?;
//!
//! let outcome = db
//!     .settlement()
//!     .settle(&order_id, PaymentMethod::Cash, Money::from_cents(8_000), Some("SAVE20"))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod report;
pub mod repository;
pub mod settlement;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Service re-exports for convenience
pub use report::ReportService;
pub use settlement::{PrintError, ReceiptPrinter, SettlementOutcome, SettlementService};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::menu::MenuRepository;
pub use repository::order::OrderRepository;
pub use repository::promotion::PromotionRepository;
pub use repository::table::TableRepository;
pub use repository::waste::WasteRepository;
