//! # Report Rows and Export Rendering
//!
//! Value types produced by the report aggregator, plus CSV rendering.
//!
//! The aggregation itself (SQL over persisted orders, waste, and stock
//! counts) lives in
//! `comanda-db::report`; this module owns the shapes those queries fill
//! and the pure rendering of aggregate rows to delimited text.
//!
//! ## Export Stability
//! Exports render money as plain decimal text (`1234.56`) and quantities
//! as plain integers — never locale-formatted — so a file produced in one
//! locale reconciles byte-for-byte with one produced in another.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::REPORT_PAGE_SIZE;

// =============================================================================
// Dimensions
// =============================================================================

/// Grouping dimension for sales summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Group by menu item name (snapshot at ordering time).
    Item,
    /// Group by calendar day.
    Day,
    /// Group by menu category.
    Category,
}

impl Dimension {
    /// Column label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Item => "item",
            Dimension::Day => "date",
            Dimension::Category => "category",
        }
    }
}

// =============================================================================
// Row Types
// =============================================================================

/// One aggregate row of a sales summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Group key: item name, `YYYY-MM-DD` day, or category name.
    pub key: String,
    /// Distinct paid orders contributing to this row.
    pub order_count: i64,
    /// Units sold within the group.
    pub quantity: i64,
    /// Revenue attributed to the group.
    pub revenue: Money,
}

/// Headline sales report: totals plus the daily breakdown and top sellers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesOverview {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_revenue: Money,
    pub order_count: i64,
    /// Revenue per day, ascending by date.
    pub daily: Vec<SummaryRow>,
    /// Best-selling items by quantity, capped at ten.
    pub top_items: Vec<SummaryRow>,
}

/// One aggregate row of the waste report, grouped by reason code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteSummaryRow {
    pub reason_code: String,
    pub quantity: i64,
    pub loss_value: Money,
}

/// One aggregate row of the inventory variance report, grouped by item.
///
/// Only items whose counts disagreed with the book value appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryVarianceRow {
    pub item: String,
    pub expected_qty: i64,
    pub counted_qty: i64,
    /// Counted minus expected; negative means shrinkage.
    pub variance_qty: i64,
    /// Variance valued at the unit cost snapshotted on each count.
    pub variance_value: Money,
}

/// A reference to one order behind an aggregate row (drill-down result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRef {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub total: Money,
}

/// One page of drill-down results.
///
/// The page size is fixed at [`REPORT_PAGE_SIZE`] to bound result size;
/// pages are 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub total_rows: i64,
}

impl<T> Page<T> {
    /// Number of pages needed for `total_rows` at the fixed page size.
    pub fn total_pages(&self) -> u32 {
        let size = REPORT_PAGE_SIZE as i64;
        ((self.total_rows + size - 1) / size).max(0) as u32
    }
}

// =============================================================================
// CSV Rendering
// =============================================================================

const WASTE_HEADER: &[&str] = &["reason", "quantity", "loss_value"];
const INVENTORY_HEADER: &[&str] = &["item", "expected", "counted", "variance", "variance_value"];

/// Renders sales summary rows as CSV with a header row.
///
/// The first column is named after the dimension the rows were grouped by.
pub fn summary_csv(dimension: Dimension, rows: &[SummaryRow]) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record([dimension.label(), "orders", "quantity", "revenue"])
        .map_err(|e| CoreError::Export(e.to_string()))?;

    for row in rows {
        wtr.write_record([
            row.key.as_str(),
            &row.order_count.to_string(),
            &row.quantity.to_string(),
            &row.revenue.plain(),
        ])
        .map_err(|e| CoreError::Export(e.to_string()))?;
    }

    finish(wtr)
}

/// Renders waste summary rows as CSV with a header row.
pub fn waste_csv(rows: &[WasteSummaryRow]) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(WASTE_HEADER)
        .map_err(|e| CoreError::Export(e.to_string()))?;

    for row in rows {
        wtr.write_record([
            row.reason_code.as_str(),
            &row.quantity.to_string(),
            &row.loss_value.plain(),
        ])
        .map_err(|e| CoreError::Export(e.to_string()))?;
    }

    finish(wtr)
}

/// Renders inventory variance rows as CSV with a header row.
pub fn inventory_csv(rows: &[InventoryVarianceRow]) -> CoreResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(INVENTORY_HEADER)
        .map_err(|e| CoreError::Export(e.to_string()))?;

    for row in rows {
        wtr.write_record([
            row.item.as_str(),
            &row.expected_qty.to_string(),
            &row.counted_qty.to_string(),
            &row.variance_qty.to_string(),
            &row.variance_value.plain(),
        ])
        .map_err(|e| CoreError::Export(e.to_string()))?;
    }

    finish(wtr)
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> CoreResult<String> {
    let bytes = wtr
        .into_inner()
        .map_err(|e| CoreError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_csv_has_header_and_plain_decimals() {
        let rows = vec![
            SummaryRow {
                key: "Pho Bo".into(),
                order_count: 3,
                quantity: 5,
                revenue: Money::from_cents(123_456),
            },
            SummaryRow {
                key: "Spring Rolls".into(),
                order_count: 1,
                quantity: 2,
                revenue: Money::from_cents(900),
            },
        ];

        let csv = summary_csv(Dimension::Item, &rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("item,orders,quantity,revenue"));
        assert_eq!(lines.next(), Some("Pho Bo,3,5,1234.56"));
        assert_eq!(lines.next(), Some("Spring Rolls,1,2,9.00"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_summary_csv_quotes_embedded_delimiters() {
        let rows = vec![SummaryRow {
            key: "Fish, Grilled".into(),
            order_count: 1,
            quantity: 1,
            revenue: Money::from_cents(1_000),
        }];

        let csv = summary_csv(Dimension::Item, &rows).unwrap();
        assert!(csv.contains("\"Fish, Grilled\",1,1,10.00"));
    }

    #[test]
    fn test_waste_csv() {
        let rows = vec![WasteSummaryRow {
            reason_code: "BURN".into(),
            quantity: 4,
            loss_value: Money::from_cents(2_550),
        }];

        let csv = waste_csv(&rows).unwrap();
        assert_eq!(csv, "reason,quantity,loss_value\nBURN,4,25.50\n");
    }

    #[test]
    fn test_inventory_csv_renders_negative_values() {
        let rows = vec![InventoryVarianceRow {
            item: "Beef Brisket".into(),
            expected_qty: 20,
            counted_qty: 17,
            variance_qty: -3,
            variance_value: Money::from_cents(-2_550),
        }];

        let csv = inventory_csv(&rows).unwrap();
        assert_eq!(
            csv,
            "item,expected,counted,variance,variance_value\nBeef Brisket,20,17,-3,-25.50\n"
        );
    }

    #[test]
    fn test_day_dimension_label() {
        let csv = summary_csv(Dimension::Day, &[]).unwrap();
        assert_eq!(csv, "date,orders,quantity,revenue\n");
    }

    #[test]
    fn test_page_math() {
        let page = Page::<OrderRef> {
            rows: vec![],
            page: 1,
            total_rows: 101,
        };
        // 101 rows at 50 per page -> 3 pages
        assert_eq!(page.total_pages(), 3);

        let empty = Page::<OrderRef> {
            rows: vec![],
            page: 1,
            total_rows: 0,
        };
        assert_eq!(empty.total_pages(), 0);
    }
}
