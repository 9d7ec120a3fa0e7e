//! # Menu Repository
//!
//! Database operations for menu items.
//!
//! Menu prices are *current* prices; order lines snapshot them at ordering
//! time, so editing or deactivating an item never rewrites order history.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::validation::{validate_item_name, validate_price_cents};
use comanda_core::{CoreError, MenuItem};

/// Repository for menu item database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    /// Creates a new MenuRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Inserts a new menu item.
    pub async fn insert(&self, name: &str, category: &str, price_cents: i64) -> DbResult<MenuItem> {
        validate_item_name(name).map_err(CoreError::from)?;
        validate_price_cents(price_cents).map_err(CoreError::from)?;

        let now = Utc::now();
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Inserting menu item");

        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, category, price_cents, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets a menu item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let item: Option<MenuItem> = sqlx::query_as(
            r#"
            SELECT id, name, category, price_cents, is_active, created_at, updated_at
            FROM menu_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active items, grouped for the ordering screen.
    pub async fn list_active(&self) -> DbResult<Vec<MenuItem>> {
        let items: Vec<MenuItem> = sqlx::query_as(
            r#"
            SELECT id, name, category, price_cents, is_active, created_at, updated_at
            FROM menu_items
            WHERE is_active = 1
            ORDER BY category, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Deactivates an item so it no longer appears on the ordering screen.
    /// Existing order lines keep their snapshots.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE menu_items SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu item", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
