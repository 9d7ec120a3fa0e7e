//! # Waste Repository
//!
//! Database operations for the kitchen waste log.
//!
//! Waste entries are append-only and exist solely to feed the waste
//! report: nothing else in the system reads them back.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use comanda_core::validation::validate_quantity;
use comanda_core::{CoreError, WasteRecord};

/// Repository for waste log database operations.
#[derive(Debug, Clone)]
pub struct WasteRepository {
    pool: SqlitePool,
}

impl WasteRepository {
    /// Creates a new WasteRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WasteRepository { pool }
    }

    /// Records one waste entry.
    pub async fn insert(
        &self,
        item_name: &str,
        reason_code: &str,
        quantity: i64,
        loss_value_cents: i64,
    ) -> DbResult<WasteRecord> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let record = WasteRecord {
            id: Uuid::new_v4().to_string(),
            item_name: item_name.trim().to_string(),
            reason_code: reason_code.trim().to_uppercase(),
            quantity,
            loss_value_cents,
            reported_at: Utc::now(),
        };

        debug!(
            item = %record.item_name,
            reason = %record.reason_code,
            "Recording waste entry"
        );

        sqlx::query(
            r#"
            INSERT INTO waste_records (id, item_name, reason_code, quantity, loss_value_cents, reported_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&record.id)
        .bind(&record.item_name)
        .bind(&record.reason_code)
        .bind(record.quantity)
        .bind(record.loss_value_cents)
        .bind(record.reported_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Entries reported within `[start, end)`, oldest first.
    pub async fn in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<WasteRecord>> {
        let records: Vec<WasteRecord> = sqlx::query_as(
            r#"
            SELECT id, item_name, reason_code, quantity, loss_value_cents, reported_at
            FROM waste_records
            WHERE reported_at >= ?1 AND reported_at < ?2
            ORDER BY reported_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::testutil::test_db;
    use chrono::Duration;

    #[tokio::test]
    async fn test_insert_and_range_query() {
        let db = test_db().await;

        db.waste().insert("Pho Bo", "burn", 2, 10_000).await.unwrap();
        db.waste()
            .insert("Spring Rolls", "EXPIRED", 5, 4_500)
            .await
            .unwrap();

        let now = Utc::now();
        let records = db
            .waste()
            .in_range(now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        // Reason codes are normalized to uppercase
        assert_eq!(records[0].reason_code, "BURN");

        let outside = db
            .waste()
            .in_range(now + Duration::hours(1), now + Duration::hours(2))
            .await
            .unwrap();
        assert!(outside.is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let db = test_db().await;

        let err = db.waste().insert("Pho", "BURN", 0, 100).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
