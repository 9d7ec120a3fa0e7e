//! # Report Service
//!
//! Aggregation queries over settled orders, the waste log, and stock
//! counts. Row shapes
//! and CSV rendering live in `comanda-core::report`; this module owns the
//! SQL that fills them.
//!
//! ## Aggregation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Report Queries                                  │
//! │                                                                         │
//! │  Range [start, end] is inclusive of the whole end day and only ever     │
//! │  sees Paid orders, bucketed by the order's creation time.               │
//! │                                                                         │
//! │  summarize(Item / Category)                                             │
//! │  └── revenue = line totals (pre-discount attribution per item)          │
//! │                                                                         │
//! │  summarize(Day) / sales_overview                                        │
//! │  └── revenue = invoice final totals (what was actually charged)         │
//! │                                                                         │
//! │  drilldown(item, page)                                                  │
//! │  └── the orders behind one aggregate row, 50 per page                   │
//! │                                                                         │
//! │  waste_summary                                                          │
//! │  └── waste entries grouped by reason code                               │
//! │                                                                         │
//! │  inventory_variance                                                     │
//! │  └── stock counts grouped by item, zero-variance items skipped          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use comanda_core::report::{
    inventory_csv, summary_csv, waste_csv, Dimension, InventoryVarianceRow, OrderRef, Page,
    SalesOverview, SummaryRow, WasteSummaryRow,
};
use comanda_core::validation::validate_date_range;
use comanda_core::{CoreError, Money, REPORT_PAGE_SIZE};

/// Number of rows in the overview's best-sellers list.
const TOP_ITEMS_LIMIT: i64 = 10;

/// Report aggregation service.
#[derive(Debug, Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    /// Creates a new ReportService.
    pub fn new(pool: SqlitePool) -> Self {
        ReportService { pool }
    }

    /// Aggregates paid orders in `[start, end]` along one dimension.
    ///
    /// Item and Category rows are ordered by revenue descending; Day rows
    /// ascending by date.
    pub async fn summarize(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        dimension: Dimension,
    ) -> DbResult<Vec<SummaryRow>> {
        validate_date_range(start, end).map_err(CoreError::from)?;
        let (from, to) = range_bounds(start, end);

        debug!(%start, %end, ?dimension, "Running sales summary");

        let rows: Vec<(String, i64, i64, i64)> = match dimension {
            Dimension::Item => {
                sqlx::query_as(
                    r#"
                    SELECT l.name_snapshot,
                           COUNT(DISTINCT o.id),
                           SUM(l.quantity),
                           SUM(l.line_total_cents)
                    FROM order_lines l
                    JOIN orders o ON o.id = l.order_id
                    WHERE o.status = 'paid' AND o.created_at >= ?1 AND o.created_at < ?2
                    GROUP BY l.name_snapshot
                    ORDER BY SUM(l.line_total_cents) DESC, l.name_snapshot
                    "#,
                )
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            Dimension::Category => {
                sqlx::query_as(
                    r#"
                    SELECT m.category,
                           COUNT(DISTINCT o.id),
                           SUM(l.quantity),
                           SUM(l.line_total_cents)
                    FROM order_lines l
                    JOIN orders o ON o.id = l.order_id
                    JOIN menu_items m ON m.id = l.menu_item_id
                    WHERE o.status = 'paid' AND o.created_at >= ?1 AND o.created_at < ?2
                    GROUP BY m.category
                    ORDER BY SUM(l.line_total_cents) DESC, m.category
                    "#,
                )
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
            Dimension::Day => {
                sqlx::query_as(
                    r#"
                    SELECT day, COUNT(*), SUM(qty), SUM(final_cents)
                    FROM (
                        SELECT o.id,
                               substr(o.created_at, 1, 10) AS day,
                               (SELECT COALESCE(SUM(l.quantity), 0)
                                FROM order_lines l WHERE l.order_id = o.id) AS qty,
                               i.final_total_cents AS final_cents
                        FROM orders o
                        JOIN invoices i ON i.order_id = o.id
                        WHERE o.status = 'paid' AND o.created_at >= ?1 AND o.created_at < ?2
                    )
                    GROUP BY day
                    ORDER BY day
                    "#,
                )
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|(key, order_count, quantity, revenue)| SummaryRow {
                key,
                order_count,
                quantity,
                revenue: Money::from_cents(revenue),
            })
            .collect())
    }

    /// Headline report: totals, daily breakdown, and the top ten sellers
    /// by quantity.
    pub async fn sales_overview(&self, start: NaiveDate, end: NaiveDate) -> DbResult<SalesOverview> {
        validate_date_range(start, end).map_err(CoreError::from)?;
        let (from, to) = range_bounds(start, end);

        let (order_count, revenue): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(i.final_total_cents), 0)
            FROM orders o
            JOIN invoices i ON i.order_id = o.id
            WHERE o.status = 'paid' AND o.created_at >= ?1 AND o.created_at < ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let daily = self.summarize(start, end, Dimension::Day).await?;

        let top: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT l.name_snapshot,
                   COUNT(DISTINCT o.id),
                   SUM(l.quantity),
                   SUM(l.line_total_cents)
            FROM order_lines l
            JOIN orders o ON o.id = l.order_id
            WHERE o.status = 'paid' AND o.created_at >= ?1 AND o.created_at < ?2
            GROUP BY l.name_snapshot
            ORDER BY SUM(l.quantity) DESC, l.name_snapshot
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(TOP_ITEMS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(SalesOverview {
            start_date: start,
            end_date: end,
            total_revenue: Money::from_cents(revenue),
            order_count,
            daily,
            top_items: top
                .into_iter()
                .map(|(key, order_count, quantity, revenue)| SummaryRow {
                    key,
                    order_count,
                    quantity,
                    revenue: Money::from_cents(revenue),
                })
                .collect(),
        })
    }

    /// The orders behind one item's aggregate row, newest first.
    ///
    /// Pages are 1-based and hold [`REPORT_PAGE_SIZE`] rows.
    pub async fn drilldown(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        item_name: &str,
        page: u32,
    ) -> DbResult<Page<OrderRef>> {
        validate_date_range(start, end).map_err(CoreError::from)?;
        let (from, to) = range_bounds(start, end);
        let page = page.max(1);

        let total_rows: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT o.id)
            FROM orders o
            JOIN order_lines l ON l.order_id = o.id
            WHERE o.status = 'paid'
              AND o.created_at >= ?1 AND o.created_at < ?2
              AND l.name_snapshot = ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(item_name)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<(String, DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            SELECT DISTINCT o.id, o.created_at, o.total_cents
            FROM orders o
            JOIN order_lines l ON l.order_id = o.id
            WHERE o.status = 'paid'
              AND o.created_at >= ?1 AND o.created_at < ?2
              AND l.name_snapshot = ?3
            ORDER BY o.created_at DESC, o.id
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(item_name)
        .bind(REPORT_PAGE_SIZE as i64)
        .bind((page as i64 - 1) * REPORT_PAGE_SIZE as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            rows: rows
                .into_iter()
                .map(|(order_id, created_at, total)| OrderRef {
                    order_id,
                    created_at,
                    total: Money::from_cents(total),
                })
                .collect(),
            page,
            total_rows,
        })
    }

    /// Waste entries in `[start, end]` grouped by reason code, biggest
    /// loss first.
    pub async fn waste_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<WasteSummaryRow>> {
        validate_date_range(start, end).map_err(CoreError::from)?;
        let (from, to) = range_bounds(start, end);

        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT reason_code, SUM(quantity), SUM(loss_value_cents)
            FROM waste_records
            WHERE reported_at >= ?1 AND reported_at < ?2
            GROUP BY reason_code
            ORDER BY SUM(loss_value_cents) DESC, reason_code
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(reason_code, quantity, loss)| WasteSummaryRow {
                reason_code,
                quantity,
                loss_value: Money::from_cents(loss),
            })
            .collect())
    }

    /// Stock-take discrepancies in `[start, end]` grouped by item.
    ///
    /// Items whose counts matched the book value are skipped; the rest are
    /// ordered worst shrinkage first.
    pub async fn inventory_variance(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<InventoryVarianceRow>> {
        validate_date_range(start, end).map_err(CoreError::from)?;
        let (from, to) = range_bounds(start, end);

        let rows: Vec<(String, i64, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT name_snapshot,
                   SUM(expected_qty),
                   SUM(counted_qty),
                   SUM(counted_qty - expected_qty),
                   SUM((counted_qty - expected_qty) * unit_cost_cents)
            FROM stock_counts
            WHERE counted_at >= ?1 AND counted_at < ?2
            GROUP BY name_snapshot
            HAVING SUM(counted_qty - expected_qty) != 0
            ORDER BY SUM((counted_qty - expected_qty) * unit_cost_cents), name_snapshot
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(item, expected_qty, counted_qty, variance_qty, value)| InventoryVarianceRow {
                    item,
                    expected_qty,
                    counted_qty,
                    variance_qty,
                    variance_value: Money::from_cents(value),
                },
            )
            .collect())
    }

    /// Renders a sales summary as CSV text.
    pub async fn summary_csv(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        dimension: Dimension,
    ) -> DbResult<String> {
        let rows = self.summarize(start, end, dimension).await?;
        Ok(summary_csv(dimension, &rows)?)
    }

    /// Renders the waste summary as CSV text.
    pub async fn waste_csv(&self, start: NaiveDate, end: NaiveDate) -> DbResult<String> {
        let rows = self.waste_summary(start, end).await?;
        Ok(waste_csv(&rows)?)
    }

    /// Renders the inventory variance report as CSV text.
    pub async fn inventory_csv(&self, start: NaiveDate, end: NaiveDate) -> DbResult<String> {
        let rows = self.inventory_variance(start, end).await?;
        Ok(inventory_csv(&rows)?)
    }
}

/// `[start, end]` as half-open UTC timestamps covering the whole end day.
fn range_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = (end + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
    (from, to)
}

// =============================================================================
// Unit Tests
// =============================================================================
