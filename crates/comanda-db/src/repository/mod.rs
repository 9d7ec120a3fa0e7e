//! # Repository Module
//!
//! Database repository implementations for Comanda.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Web handler                                                           │
//! │       │                                                                 │
//! │       │  db.orders().add_line(&order_id, &item, 2, None)               │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── open_order(&self, table_id, opened_by)                            │
//! │  ├── add_line(&self, order_id, item, qty, note)                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── submit_to_kitchen(&self, id)                                      │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Cross-record writes that must be atomic (settlement) live in the      │
//! │  service layer instead, which owns the transaction boundary.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`table::TableRepository`] - Dining table records and status
//! - [`menu::MenuRepository`] - Menu item CRUD
//! - [`order::OrderRepository`] - Orders, lines, and kitchen lifecycle
//! - [`promotion::PromotionRepository`] - Promotions and code resolution
//! - [`waste::WasteRepository`] - Kitchen waste log
//! - [`inventory::InventoryRepository`] - Ingredient stock and counts

pub mod inventory;
pub mod menu;
pub mod order;
pub mod promotion;
pub mod table;
pub mod waste;
