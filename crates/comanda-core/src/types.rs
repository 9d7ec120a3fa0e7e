//! # Domain Types
//!
//! Core domain records used throughout Comanda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Records                              │
//! │                                                                     │
//! │  DiningTable ──┐                                                    │
//! │                ├──► Order ──► OrderLine (price snapshot)            │
//! │  MenuItem ─────┘      │                                             │
//! │                       │ settle()                                    │
//! │                       ▼                                             │
//! │  Promotion ──► SettlementTx (one per attempt, append-only)          │
//! │        │              │ on success                                  │
//! │        │              ▼                                             │
//! │        └─────► Invoice (immutable audit snapshot)                   │
//! │                                                                     │
//! │  WasteRecord (kitchen log, feeds the waste report)                  │
//! │  InventoryItem ──► StockCount (feeds the variance report)           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record has a UUID v4 string `id`; human-facing identifiers (table
//! name, promo code) are separate unique columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Dining Table
// =============================================================================

/// Lifecycle of a physical table in the dining room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Dirty,
}

impl Default for TableStatus {
    fn default() -> Self {
        TableStatus::Available
    }
}

/// A physical table in the restaurant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: String,
    /// Human-facing name, e.g. "T-01", "VIP-02". Unique.
    pub name: String,
    pub capacity: i64,
    pub status: TableStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiningTable {
    /// A table can seat new guests only while Available.
    pub fn is_available(&self) -> bool {
        self.status == TableStatus::Available
    }
}

// =============================================================================
// Menu Item
// =============================================================================

/// A dish or drink available for ordering.
///
/// The price here is the *current* price; order lines snapshot it at
/// ordering time so menu edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// Category name used as a reporting dimension.
    pub category: String,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// The lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order open, items being added.
    Pending,
    /// Sent to the kitchen.
    Cooking,
    /// All items delivered to the table.
    Served,
    /// Payment settled; terminal state.
    Paid,
    /// Order voided; terminal state.
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    /// Whether a settlement attempt may proceed from this status.
    pub fn is_settleable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Cooking | OrderStatus::Served
        )
    }
}

/// A sales order: header of one table's bill.
///
/// Invariant: `total_cents` equals the sum of the lines' extended prices
/// until settlement applies a discount. The pre-discount total is then
/// preserved on the [`Invoice`], not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub table_id: Option<String>,
    pub status: OrderStatus,
    pub total_cents: i64,
    /// Set only by a successful settlement that applied a promotion.
    /// A non-null value here rejects any further promo code (double-apply
    /// guard).
    pub promotion_id: Option<String>,
    /// Staff member who opened the order.
    pub opened_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item within an order.
/// Uses the snapshot pattern to freeze menu data at ordering time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Item name at ordering time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at ordering time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Extended price (unit price × quantity).
    pub line_total_cents: i64,
    /// Special instructions, e.g. "no onions".
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// How a promotion's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `discount_value` is basis points of the eligible subtotal
    /// (2000 = 20%).
    Percent,
    /// `discount_value` is a flat amount in cents, clamped to the eligible
    /// subtotal.
    Flat,
}

/// A marketing promotion identified by a unique code.
///
/// Read-only during settlement: evaluation never mutates the promotion or
/// tracks usage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Promotion {
    pub id: String,
    pub name: String,
    /// Unique redemption code, e.g. "SAVE20".
    pub code: String,
    pub discount_kind: DiscountKind,
    /// Basis points for [`DiscountKind::Percent`], cents for
    /// [`DiscountKind::Flat`].
    pub discount_value: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    /// Menu item ids this promotion is restricted to. Empty means the
    /// promotion applies to the whole order. Loaded from the link table,
    /// not a column, so row decoding skips it.
    #[serde(default)]
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub eligible_item_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// A promotion is usable only while active and inside its validity
    /// window (inclusive on both ends).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.starts_at <= now && now <= self.ends_at
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Closed set of accepted payment methods.
///
/// Each variant carries its own tender rule (see
/// [`crate::settlement::validate_tender`]); there is no runtime type
/// inspection anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the customer may tender more than due.
    Cash,
    /// Card terminal; captures exactly the amount due.
    Card,
    /// QR / wallet payment; captures exactly the amount due.
    Qr,
}

// =============================================================================
// Settlement Transaction
// =============================================================================

/// Outcome of one settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Success,
    Failed,
}

/// Append-only record of one settlement attempt, failures included.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SettlementTx {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    pub amount_tendered_cents: i64,
    pub amount_due_cents: i64,
    pub status: TxStatus,
    /// Present when a promotion was resolved for this attempt, even on
    /// failure.
    pub promotion_id: Option<String>,
    pub discount_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SettlementTx {
    #[inline]
    pub fn amount_due(&self) -> Money {
        Money::from_cents(self.amount_due_cents)
    }

    #[inline]
    pub fn amount_tendered(&self) -> Money {
        Money::from_cents(self.amount_tendered_cents)
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// Immutable audit snapshot created on a successful settlement.
///
/// Decoupled from later changes to the Order: the pre-discount total lives
/// here and only here once the order's running total has been reduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: String,
    pub order_id: String,
    pub original_total_cents: i64,
    pub discount_cents: i64,
    pub promotion_id: Option<String>,
    pub final_total_cents: i64,
    pub method: PaymentMethod,
    pub issued_at: DateTime<Utc>,
}

impl Invoice {
    #[inline]
    pub fn original_total(&self) -> Money {
        Money::from_cents(self.original_total_cents)
    }

    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.final_total_cents)
    }
}

// =============================================================================
// Waste Record
// =============================================================================

/// One kitchen waste entry (burnt dish, expired stock, ...).
/// Input to the waste report; nothing else reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct WasteRecord {
    pub id: String,
    pub item_name: String,
    /// Standardized reason code, e.g. "BURN", "EXPIRED".
    pub reason_code: String,
    pub quantity: i64,
    pub loss_value_cents: i64,
    pub reported_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked ingredient and its current book quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: String,
    /// Stock keeping unit, unique per item.
    pub sku: String,
    pub name: String,
    /// Unit of measure, e.g. "kg", "liter", "piece".
    pub unit: String,
    pub quantity_on_hand: i64,
    /// On-hand at or below this level counts as low stock.
    pub alert_threshold: i64,
    pub unit_cost_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity_on_hand <= self.alert_threshold
    }
}

/// One physical count of one inventory item.
///
/// The expected quantity is the book value snapshotted at counting time;
/// the difference against what was actually counted feeds the variance
/// report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockCount {
    pub id: String,
    pub inventory_item_id: String,
    pub name_snapshot: String,
    pub expected_qty: i64,
    pub counted_qty: i64,
    /// Unit cost snapshotted at counting time; values the variance.
    pub unit_cost_cents: i64,
    pub reason: Option<String>,
    pub counted_at: DateTime<Utc>,
}

impl StockCount {
    /// Counted minus expected. Negative means shrinkage.
    pub fn variance_qty(&self) -> i64 {
        self.counted_qty - self.expected_qty
    }

    pub fn variance_value(&self) -> Money {
        Money::from_cents(self.variance_qty() * self.unit_cost_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_order_status_settleable() {
        assert!(OrderStatus::Pending.is_settleable());
        assert!(OrderStatus::Cooking.is_settleable());
        assert!(OrderStatus::Served.is_settleable());
        assert!(!OrderStatus::Paid.is_settleable());
        assert!(!OrderStatus::Cancelled.is_settleable());
    }

    #[test]
    fn test_promotion_validity_window() {
        let now = Utc::now();
        let promo = Promotion {
            id: "p1".into(),
            name: "Test".into(),
            code: "SAVE10".into(),
            discount_kind: DiscountKind::Percent,
            discount_value: 1000,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            is_active: true,
            eligible_item_ids: vec![],
            created_at: now,
            updated_at: now,
        };

        assert!(promo.is_valid_at(now));
        // Boundary timestamps are inclusive
        assert!(promo.is_valid_at(promo.starts_at));
        assert!(promo.is_valid_at(promo.ends_at));
        assert!(!promo.is_valid_at(now + Duration::days(2)));
        assert!(!promo.is_valid_at(now - Duration::days(2)));

        let inactive = Promotion {
            is_active: false,
            ..promo
        };
        assert!(!inactive.is_valid_at(now));
    }

    #[test]
    fn test_stock_count_variance() {
        let now = Utc::now();
        let count = StockCount {
            id: "c1".into(),
            inventory_item_id: "i1".into(),
            name_snapshot: "Beef Brisket".into(),
            expected_qty: 20,
            counted_qty: 17,
            unit_cost_cents: 850,
            reason: Some("spoilage".into()),
            counted_at: now,
        };

        assert_eq!(count.variance_qty(), -3);
        assert_eq!(count.variance_value().cents(), -2_550);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let now = Utc::now();
        let mut item = InventoryItem {
            id: "i1".into(),
            sku: "BEEF-01".into(),
            name: "Beef Brisket".into(),
            unit: "kg".into(),
            quantity_on_hand: 5,
            alert_threshold: 5,
            unit_cost_cents: 850,
            created_at: now,
            updated_at: now,
        };
        assert!(item.is_low_stock());

        item.quantity_on_hand = 6;
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_table_availability() {
        let now = Utc::now();
        let mut table = DiningTable {
            id: "t1".into(),
            name: "T-01".into(),
            capacity: 4,
            status: TableStatus::Available,
            created_at: now,
            updated_at: now,
        };
        assert!(table.is_available());

        table.status = TableStatus::Occupied;
        assert!(!table.is_available());
    }
}
