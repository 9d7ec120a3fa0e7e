//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. OPEN                                                                │
//! │     └── open_order() → Order { status: Pending }                        │
//! │         (table, if any, flips Available → Occupied)                     │
//! │                                                                         │
//! │  2. BUILD THE BILL                                                      │
//! │     └── add_line() → snapshot of name + price, same item merges         │
//! │     └── remove_line() → decrement, drop at zero                         │
//! │         (order total recomputed from lines on every change)             │
//! │                                                                         │
//! │  3. KITCHEN                                                             │
//! │     └── submit_to_kitchen() → Pending → Cooking                         │
//! │     └── mark_served()       → Cooking → Served                          │
//! │                                                                         │
//! │  4. CLOSE                                                               │
//! │     └── SettlementService::settle() → Paid   (separate module)          │
//! │     └── cancel()                    → Cancelled, table freed            │
//! │                                                                         │
//! │  Status transitions are guarded by a status predicate in the UPDATE     │
//! │  plus a rows_affected check, so a stale screen can never re-fire a      │
//! │  transition that already happened.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::validation::validate_quantity;
use comanda_core::{
    CoreError, MenuItem, Order, OrderLine, OrderStatus, MAX_LINE_QUANTITY, MAX_ORDER_LINES,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Opens a new order, optionally seated at a table.
    ///
    /// The table must be Available and flips to Occupied in the same
    /// transaction.
    pub async fn open_order(&self, table_id: Option<&str>, opened_by: &str) -> DbResult<Order> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            table_id: table_id.map(String::from),
            status: OrderStatus::Pending,
            total_cents: 0,
            promotion_id: None,
            opened_by: opened_by.to_string(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, table_id = ?order.table_id, "Opening order");

        let mut tx = self.pool.begin().await?;

        if let Some(table_id) = table_id {
            let seated = sqlx::query(
                r#"
                UPDATE dining_tables SET status = 'occupied', updated_at = ?2
                WHERE id = ?1 AND status = 'available'
                "#,
            )
            .bind(table_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if seated.rows_affected() == 0 {
                return Err(DbError::not_found("Available table", table_id));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, table_id, status, total_cents, promotion_id,
                opened_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.table_id)
        .bind(order.status)
        .bind(order.total_cents)
        .bind(&order.promotion_id)
        .bind(&order.opened_by)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        get_order(&mut conn, id).await
    }

    /// Gets all lines for an order, oldest first.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let mut conn = self.pool.acquire().await?;
        get_lines(&mut conn, order_id).await
    }

    /// Adds an item to a pending order.
    ///
    /// ## Snapshot Pattern
    /// Item name and price are copied onto the line, so later menu edits
    /// never change what this table was charged.
    ///
    /// ## Merging
    /// Adding an item already on the order increments the existing line's
    /// quantity instead of creating a second line.
    pub async fn add_line(
        &self,
        order_id: &str,
        item: &MenuItem,
        quantity: i64,
        note: Option<&str>,
    ) -> DbResult<OrderLine> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = get_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current_status: format!("{:?}", order.status).to_lowercase(),
            }
            .into());
        }

        let existing: Option<OrderLine> = sqlx::query_as(
            r#"
            SELECT id, order_id, menu_item_id, name_snapshot, unit_price_cents,
                   quantity, line_total_cents, note, created_at
            FROM order_lines
            WHERE order_id = ?1 AND menu_item_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(&item.id)
        .fetch_optional(&mut *tx)
        .await?;

        let line = match existing {
            Some(line) => {
                let merged = line.quantity + quantity;
                if merged > MAX_LINE_QUANTITY {
                    return Err(CoreError::QuantityTooLarge {
                        requested: merged,
                        max: MAX_LINE_QUANTITY,
                    }
                    .into());
                }

                let line_total = line.unit_price_cents * merged;
                sqlx::query(
                    r#"
                    UPDATE order_lines SET quantity = ?2, line_total_cents = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(&line.id)
                .bind(merged)
                .bind(line_total)
                .execute(&mut *tx)
                .await?;

                OrderLine {
                    quantity: merged,
                    line_total_cents: line_total,
                    ..line
                }
            }
            None => {
                let line_count: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE order_id = ?1")
                        .bind(order_id)
                        .fetch_one(&mut *tx)
                        .await?;
                if line_count as usize >= MAX_ORDER_LINES {
                    return Err(CoreError::OrderTooLarge {
                        max: MAX_ORDER_LINES,
                    }
                    .into());
                }

                let line = OrderLine {
                    id: Uuid::new_v4().to_string(),
                    order_id: order_id.to_string(),
                    menu_item_id: item.id.clone(),
                    name_snapshot: item.name.clone(),
                    unit_price_cents: item.price_cents,
                    quantity,
                    line_total_cents: item.price_cents * quantity,
                    note: note.map(String::from),
                    created_at: now,
                };

                debug!(order_id, item = %item.name, quantity, "Adding order line");

                sqlx::query(
                    r#"
                    INSERT INTO order_lines (
                        id, order_id, menu_item_id, name_snapshot, unit_price_cents,
                        quantity, line_total_cents, note, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                )
                .bind(&line.id)
                .bind(&line.order_id)
                .bind(&line.menu_item_id)
                .bind(&line.name_snapshot)
                .bind(line.unit_price_cents)
                .bind(line.quantity)
                .bind(line.line_total_cents)
                .bind(&line.note)
                .bind(line.created_at)
                .execute(&mut *tx)
                .await?;

                line
            }
        };

        recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(line)
    }

    /// Removes `quantity` units of an item from a pending order.
    ///
    /// The line is deleted once its quantity reaches zero.
    pub async fn remove_line(
        &self,
        order_id: &str,
        menu_item_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        validate_quantity(quantity).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let order = get_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current_status: format!("{:?}", order.status).to_lowercase(),
            }
            .into());
        }

        let line: OrderLine = sqlx::query_as(
            r#"
            SELECT id, order_id, menu_item_id, name_snapshot, unit_price_cents,
                   quantity, line_total_cents, note, created_at
            FROM order_lines
            WHERE order_id = ?1 AND menu_item_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(menu_item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order line", menu_item_id))?;

        let remaining = line.quantity - quantity;
        if remaining > 0 {
            sqlx::query(
                r#"
                UPDATE order_lines SET quantity = ?2, line_total_cents = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&line.id)
            .bind(remaining)
            .bind(line.unit_price_cents * remaining)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("DELETE FROM order_lines WHERE id = ?1")
                .bind(&line.id)
                .execute(&mut *tx)
                .await?;
        }

        recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Sends a pending order to the kitchen (Pending → Cooking).
    pub async fn submit_to_kitchen(&self, order_id: &str) -> DbResult<()> {
        let lines = self.get_lines(order_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder(order_id.to_string()).into());
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = 'cooking', updated_at = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (pending)", order_id));
        }

        Ok(())
    }

    /// Marks a cooking order as fully delivered (Cooking → Served).
    pub async fn mark_served(&self, order_id: &str) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = 'served', updated_at = ?2
            WHERE id = ?1 AND status = 'cooking'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (cooking)", order_id));
        }

        Ok(())
    }

    /// Voids an unpaid order and frees its table.
    pub async fn cancel(&self, order_id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order = get_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET status = 'cancelled', updated_at = ?2
            WHERE id = ?1 AND status IN ('pending', 'cooking', 'served')
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (open)", order_id));
        }

        if let Some(table_id) = &order.table_id {
            sqlx::query(
                r#"
                UPDATE dining_tables SET status = 'available', updated_at = ?2
                WHERE id = ?1 AND status = 'occupied'
                "#,
            )
            .bind(table_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Connection-Level Helpers (shared with the settlement service)
// =============================================================================

pub(crate) async fn get_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        SELECT id, table_id, status, total_cents, promotion_id,
               opened_by, created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

pub(crate) async fn get_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderLine>> {
    let lines: Vec<OrderLine> = sqlx::query_as(
        r#"
        SELECT id, order_id, menu_item_id, name_snapshot, unit_price_cents,
               quantity, line_total_cents, note, created_at
        FROM order_lines
        WHERE order_id = ?1
        ORDER BY created_at, id
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

/// Resets the order total to the sum of its lines.
///
/// Only valid while no discount has been applied; settlement overwrites
/// the total once and the order never changes again.
async fn recompute_total(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE orders SET
            total_cents = (
                SELECT COALESCE(SUM(line_total_cents), 0)
                FROM order_lines WHERE order_id = ?1
            ),
            updated_at = ?2
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(order_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order (pending)", order_id));
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
