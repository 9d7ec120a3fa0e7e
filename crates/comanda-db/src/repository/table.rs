//! # Dining Table Repository
//!
//! Database operations for physical tables in the dining room.
//!
//! Table status transitions are driven elsewhere: opening an order marks
//! its table Occupied, a successful settlement frees it. This repository
//! only provides the record operations those flows build on.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::validation::validate_table_name;
use comanda_core::{CoreError, DiningTable, TableStatus};

/// Repository for dining table database operations.
#[derive(Debug, Clone)]
pub struct TableRepository {
    pool: SqlitePool,
}

impl TableRepository {
    /// Creates a new TableRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TableRepository { pool }
    }

    /// Inserts a new table. Names are unique across the restaurant.
    pub async fn insert(&self, name: &str, capacity: i64) -> DbResult<DiningTable> {
        validate_table_name(name).map_err(CoreError::from)?;

        let now = Utc::now();
        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            capacity,
            status: TableStatus::Available,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %table.id, name = %table.name, "Inserting dining table");

        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, name, capacity, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&table.id)
        .bind(&table.name)
        .bind(table.capacity)
        .bind(table.status)
        .bind(table.created_at)
        .bind(table.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(table)
    }

    /// Gets a table by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DiningTable>> {
        let table: Option<DiningTable> = sqlx::query_as(
            r#"
            SELECT id, name, capacity, status, created_at, updated_at
            FROM dining_tables
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(table)
    }

    /// Lists all tables, ordered by name for the floor map.
    pub async fn list(&self) -> DbResult<Vec<DiningTable>> {
        let tables: Vec<DiningTable> = sqlx::query_as(
            r#"
            SELECT id, name, capacity, status, created_at, updated_at
            FROM dining_tables
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Sets a table's status unconditionally.
    pub async fn set_status(&self, id: &str, status: TableStatus) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE dining_tables SET status = ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }

        Ok(())
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
    async fn test_insert_and_get() {
        let db = test_db().await;

        let table = db.tables().insert("T-01", 4).await.unwrap();
        let loaded = db.tables().get_by_id(&table.id).await.unwrap().unwrap();

        assert_eq!(loaded.name, "T-01");
        assert_eq!(loaded.capacity, 4);
        assert_eq!(loaded.status, TableStatus::Available);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;

        db.tables().insert("T-01", 4).await.unwrap();
        let err = db.tables().insert("T-01", 2).await.unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_set_status() {
        let db = test_db().await;

        let table = db.tables().insert("T-02", 2).await.unwrap();
        db.tables()
            .set_status(&table.id, TableStatus::Reserved)
            .await
            .unwrap();

        let loaded = db.tables().get_by_id(&table.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, TableStatus::Reserved);

        let err = db
            .tables()
            .set_status("missing", TableStatus::Dirty)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
