//! # Inventory Repository
//!
//! Database operations for ingredient stock and stock-take counts.
//!
//! ## Counting Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 record_count(item, counted, reason)                     │
//! │                                                                         │
//! │  1. Read the item's book quantity and unit cost                         │
//! │  2. INSERT a stock_counts row snapshotting both                         │
//! │  3. UPDATE the item: on-hand becomes the counted value                  │
//! │                                                                         │
//! │  All in one transaction; the snapshot and the correction never          │
//! │  disagree. The variance report reads the count rows, not the item.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::validation::validate_item_name;
use comanda_core::{CoreError, InventoryItem, StockCount, ValidationError};

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Registers a stocked item.
    pub async fn insert(
        &self,
        sku: &str,
        name: &str,
        unit: &str,
        quantity_on_hand: i64,
        alert_threshold: i64,
        unit_cost_cents: i64,
    ) -> DbResult<InventoryItem> {
        validate_item_name(name).map_err(CoreError::from)?;
        if quantity_on_hand < 0 || unit_cost_cents < 0 {
            return Err(CoreError::from(ValidationError::MustBePositive {
                field: "inventory amounts".to_string(),
            })
            .into());
        }

        let now = Utc::now();
        let item = InventoryItem {
            id: Uuid::new_v4().to_string(),
            sku: sku.trim().to_uppercase(),
            name: name.trim().to_string(),
            unit: unit.trim().to_string(),
            quantity_on_hand,
            alert_threshold,
            unit_cost_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(sku = %item.sku, "Registering inventory item");

        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, sku, name, unit, quantity_on_hand, alert_threshold,
                unit_cost_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.quantity_on_hand)
        .bind(item.alert_threshold)
        .bind(item.unit_cost_cents)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Looks an item up by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<InventoryItem>> {
        let item: Option<InventoryItem> = sqlx::query_as(
            r#"
            SELECT id, sku, name, unit, quantity_on_hand, alert_threshold,
                   unit_cost_cents, created_at, updated_at
            FROM inventory_items
            WHERE sku = ?1
            "#,
        )
        .bind(sku.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Items at or below their alert threshold, ordered by name.
    pub async fn list_low_stock(&self) -> DbResult<Vec<InventoryItem>> {
        let items: Vec<InventoryItem> = sqlx::query_as(
            r#"
            SELECT id, sku, name, unit, quantity_on_hand, alert_threshold,
                   unit_cost_cents, created_at, updated_at
            FROM inventory_items
            WHERE quantity_on_hand <= alert_threshold
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Records a physical count and corrects the book quantity to match.
    ///
    /// The pre-count quantity and the unit cost are snapshotted onto the
    /// count row; the variance report reads those snapshots.
    pub async fn record_count(
        &self,
        item_id: &str,
        counted_qty: i64,
        reason: Option<&str>,
    ) -> DbResult<StockCount> {
        if counted_qty < 0 {
            return Err(CoreError::from(ValidationError::MustBePositive {
                field: "counted quantity".to_string(),
            })
            .into());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let item: Option<InventoryItem> = sqlx::query_as(
            r#"
            SELECT id, sku, name, unit, quantity_on_hand, alert_threshold,
                   unit_cost_cents, created_at, updated_at
            FROM inventory_items
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;
        let item = item.ok_or_else(|| DbError::not_found("InventoryItem", item_id))?;

        let count = StockCount {
            id: Uuid::new_v4().to_string(),
            inventory_item_id: item.id.clone(),
            name_snapshot: item.name.clone(),
            expected_qty: item.quantity_on_hand,
            counted_qty,
            unit_cost_cents: item.unit_cost_cents,
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            counted_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_counts (
                id, inventory_item_id, name_snapshot, expected_qty,
                counted_qty, unit_cost_cents, reason, counted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&count.id)
        .bind(&count.inventory_item_id)
        .bind(&count.name_snapshot)
        .bind(count.expected_qty)
        .bind(count.counted_qty)
        .bind(count.unit_cost_cents)
        .bind(&count.reason)
        .bind(count.counted_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE inventory_items SET quantity_on_hand = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(counted_qty)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            item = %count.name_snapshot,
            variance = count.variance_qty(),
            "Stock count recorded"
        );

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;

    #[tokio::test]
    async fn test_insert_and_low_stock_listing() {
        let db = test_db().await;

        db.inventory()
            .insert("beef-01", "Beef Brisket", "kg", 3, 5, 850)
            .await
            .unwrap();
        db.inventory()
            .insert("RICE-01", "Jasmine Rice", "kg", 40, 10, 120)
            .await
            .unwrap();

        // SKUs are normalized to uppercase
        let beef = db.inventory().get_by_sku("BEEF-01").await.unwrap().unwrap();
        assert_eq!(beef.name, "Beef Brisket");
        assert!(beef.is_low_stock());

        let low = db.inventory().list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "BEEF-01");
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;

        db.inventory()
            .insert("BEEF-01", "Beef Brisket", "kg", 10, 5, 850)
            .await
            .unwrap();
        let err = db
            .inventory()
            .insert("BEEF-01", "Beef Shank", "kg", 10, 5, 700)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_record_count_snapshots_and_corrects_book_value() {
        let db = test_db().await;

        let item = db
            .inventory()
            .insert("BEEF-01", "Beef Brisket", "kg", 20, 5, 850)
            .await
            .unwrap();

        let count = db
            .inventory()
            .record_count(&item.id, 17, Some("spoilage"))
            .await
            .unwrap();
        assert_eq!(count.expected_qty, 20);
        assert_eq!(count.counted_qty, 17);
        assert_eq!(count.variance_qty(), -3);
        assert_eq!(count.variance_value().cents(), -2_550);

        // On-hand now matches the count; the next count expects 17
        let item = db.inventory().get_by_sku("BEEF-01").await.unwrap().unwrap();
        assert_eq!(item.quantity_on_hand, 17);

        let next = db.inventory().record_count(&item.id, 17, None).await.unwrap();
        assert_eq!(next.variance_qty(), 0);
    }

    #[tokio::test]
    async fn test_count_of_unknown_item_rejected() {
        let db = test_db().await;

        let err = db
            .inventory()
            .record_count("missing", 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let item = db
            .inventory()
            .insert("BEEF-01", "Beef Brisket", "kg", 20, 5, 850)
            .await
            .unwrap();
        let err = db
            .inventory()
            .record_count(&item.id, -1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
