//! # Settlement Service
//!
//! The committing half of payment settlement. All pure math (discount
//! evaluation, the quote, tender rules) lives in `comanda-core`; this
//! module owns the transaction boundary around it.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 settle(order, method, tendered, code?)                  │
//! │                                                                         │
//! │  0. Double-apply guard (plain read, before any lock):                   │
//! │     code supplied + order already carries a promotion → reject,         │
//! │     no transaction row is written                                       │
//! │                                                                         │
//! │  1. BEGIN; self-assigning UPDATE on the order row takes the write       │
//! │     lock up front (the single-row analog of SELECT ... FOR UPDATE)      │
//! │                                                                         │
//! │  2. Re-read order under the lock                                        │
//! │     ├── paid      → OrderAlreadyPaid                                    │
//! │     └── cancelled → InvalidOrderStatus                                  │
//! │                                                                         │
//! │  3. Resolve code → evaluate promotion → quote                           │
//! │     (unknown/expired codes silently evaluate to zero discount)          │
//! │                                                                         │
//! │  4. Tender rule per method                                              │
//! │     ├── short cash → INSERT Failed tx, COMMIT, failed outcome           │
//! │     └── covered    → INSERT Success tx + Invoice, order → paid,         │
//! │                      table freed, COMMIT                                │
//! │                                                                         │
//! │  5. Post-commit: receipt print on a background task (failures are       │
//! │     logged, never surfaced)                                             │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction → full rollback.         │
//! │  A busy database surfaces as DbError::Busy; this module never           │
//! │  retries on the caller's behalf.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{order, promotion};
use comanda_core::settlement::{self, Quote};
use comanda_core::validation::validate_promo_code;
use comanda_core::{
    promotion as promo_eval, CoreError, Invoice, Money, Order, OrderStatus, PaymentMethod,
    Promotion, SettlementTx, TxStatus,
};

// =============================================================================
// Receipt Printer Seam
// =============================================================================

/// Receipt printing failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PrintError(pub String);

/// Seam between settlement and receipt hardware.
///
/// Implementations drive an actual printer (or a PDF generator, or a
/// no-op); tests plug in a recording fake. Printing happens after commit
/// on a background task, so implementations may block.
pub trait ReceiptPrinter: Send + Sync + 'static {
    fn print(&self, invoice: &Invoice) -> Result<(), PrintError>;
}

// =============================================================================
// Outcome
// =============================================================================

/// Result of one settlement attempt that was recorded.
///
/// Business failures that leave an audit trail (short cash) come back as
/// an outcome with a Failed transaction; failures that must leave no
/// trace (duplicate promotion, already paid) are errors instead.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    /// The append-only transaction row written for this attempt.
    pub transaction: SettlementTx,
    /// Present only when the attempt succeeded.
    pub invoice: Option<Invoice>,
}

impl SettlementOutcome {
    pub fn is_success(&self) -> bool {
        self.transaction.status == TxStatus::Success
    }

    /// How much more the customer owes, for failed attempts.
    pub fn shortfall(&self) -> Option<Money> {
        match self.transaction.status {
            TxStatus::Failed => Some(
                self.transaction
                    .amount_due()
                    .saturating_sub_zero(self.transaction.amount_tendered()),
            ),
            TxStatus::Success => None,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// The committing settlement service.
#[derive(Clone)]
pub struct SettlementService {
    pool: SqlitePool,
    printer: Option<Arc<dyn ReceiptPrinter>>,
}

impl SettlementService {
    /// Creates a settlement service without a printer attached.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementService {
            pool,
            printer: None,
        }
    }

    /// Attaches a receipt printer for post-commit printing.
    pub fn with_printer(mut self, printer: Arc<dyn ReceiptPrinter>) -> Self {
        self.printer = Some(printer);
        self
    }

    /// Settles an order.
    ///
    /// ## Arguments
    /// * `order_id` - The order being paid
    /// * `method` - Cash, Card, or Qr
    /// * `tendered` - Amount handed over (Cash); ignored for exact-capture
    ///   methods, which charge the amount due
    /// * `promo_code` - Optional promo code entered at checkout; an empty
    ///   or whitespace-only code means no code
    ///
    /// ## Returns
    /// * `Ok(outcome)` - A transaction row was written: success, or a
    ///   recorded insufficient-cash failure
    /// * `Err(_)` - Nothing was written (unknown order, already paid,
    ///   duplicate promotion, cancelled, busy database)
    pub async fn settle(
        &self,
        order_id: &str,
        method: PaymentMethod,
        tendered: Money,
        promo_code: Option<&str>,
    ) -> DbResult<SettlementOutcome> {
        // A blank code box submits as "", which means no code at all
        let promo_code = promo_code.map(str::trim).filter(|c| !c.is_empty());
        if let Some(code) = promo_code {
            validate_promo_code(code).map_err(CoreError::from)?;

            // Double-apply guard on a plain read, before taking any lock.
            // Rejected attempts leave no transaction row.
            let mut conn = self.pool.acquire().await?;
            if let Some(order) = order::get_order(&mut conn, order_id).await? {
                if let Some(existing) = order.promotion_id {
                    return Err(CoreError::DuplicatePromotion {
                        order_id: order_id.to_string(),
                        existing,
                    }
                    .into());
                }
            }
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Take the write lock before reading anything we decide on.
        let locked = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE id = ?1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        let order = order::get_order(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        check_settleable(&order)?;
        if let (Some(_), Some(existing)) = (promo_code, &order.promotion_id) {
            return Err(CoreError::DuplicatePromotion {
                order_id: order_id.to_string(),
                existing: existing.clone(),
            }
            .into());
        }

        let lines = order::get_lines(&mut tx, order_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder(order_id.to_string()).into());
        }

        let promotion = resolve_code(&mut tx, promo_code, now).await?;
        let evaluation = promo_eval::evaluate(promotion.as_ref(), &lines, now);
        let quote = settlement::quote(order.total(), evaluation);

        debug!(
            order_id,
            due = %quote.amount_due,
            discount = %quote.discount,
            "Settlement quote computed"
        );

        match settlement::validate_tender(method, tendered, quote.amount_due) {
            Err(CoreError::InsufficientPayment { short_by }) => {
                let record = new_transaction(order_id, method, tendered, &quote, TxStatus::Failed, now);
                insert_transaction(&mut tx, &record).await?;
                tx.commit().await?;

                warn!(order_id, short_by = %short_by, "Settlement failed: insufficient payment");

                Ok(SettlementOutcome {
                    transaction: record,
                    invoice: None,
                })
            }
            Err(other) => Err(other.into()),
            Ok(captured) => {
                let record =
                    new_transaction(order_id, method, captured, &quote, TxStatus::Success, now);
                insert_transaction(&mut tx, &record).await?;

                let invoice = Invoice {
                    id: Uuid::new_v4().to_string(),
                    order_id: order_id.to_string(),
                    original_total_cents: quote.original_total.cents(),
                    discount_cents: quote.discount.cents(),
                    promotion_id: quote.promotion_id.clone(),
                    final_total_cents: quote.amount_due.cents(),
                    method,
                    issued_at: now,
                };
                insert_invoice(&mut tx, &invoice).await?;

                let updated = sqlx::query(
                    r#"
                    UPDATE orders SET
                        status = 'paid',
                        total_cents = ?2,
                        promotion_id = ?3,
                        updated_at = ?4
                    WHERE id = ?1 AND status IN ('pending', 'cooking', 'served')
                    "#,
                )
                .bind(order_id)
                .bind(quote.amount_due.cents())
                .bind(&quote.promotion_id)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                if updated.rows_affected() == 0 {
                    return Err(DbError::TransactionFailed(format!(
                        "order {order_id} left its settleable state during settlement"
                    )));
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

                info!(
                    order_id,
                    amount = %quote.amount_due,
                    promotion = ?quote.promotion_id,
                    "Order settled"
                );

                self.spawn_receipt(&invoice);

                Ok(SettlementOutcome {
                    transaction: record,
                    invoice: Some(invoice),
                })
            }
        }
    }

    /// Prices a settlement without committing anything.
    ///
    /// Exactly the math of [`settle`](Self::settle) steps 3 and 4, on plain
    /// reads: no transaction, no lock, no mutation. Calling it any number
    /// of times returns the same quote.
    pub async fn preview(&self, order_id: &str, promo_code: Option<&str>) -> DbResult<Quote> {
        let promo_code = promo_code.map(str::trim).filter(|c| !c.is_empty());
        if let Some(code) = promo_code {
            validate_promo_code(code).map_err(CoreError::from)?;
        }

        let now = Utc::now();
        let mut conn = self.pool.acquire().await?;

        let order = order::get_order(&mut conn, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        check_settleable(&order)?;
        if let (Some(_), Some(existing)) = (promo_code, &order.promotion_id) {
            return Err(CoreError::DuplicatePromotion {
                order_id: order_id.to_string(),
                existing: existing.clone(),
            }
            .into());
        }

        let lines = order::get_lines(&mut conn, order_id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder(order_id.to_string()).into());
        }

        let promotion = resolve_code(&mut conn, promo_code, now).await?;
        let evaluation = promo_eval::evaluate(promotion.as_ref(), &lines, now);

        Ok(settlement::quote(order.total(), evaluation))
    }

    /// Transactions recorded for an order, oldest first. Audit view.
    pub async fn transactions(&self, order_id: &str) -> DbResult<Vec<SettlementTx>> {
        let records: Vec<SettlementTx> = sqlx::query_as(
            r#"
            SELECT id, order_id, method, amount_tendered_cents, amount_due_cents,
                   status, promotion_id, discount_cents, created_at
            FROM settlement_transactions
            WHERE order_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// The invoice for a settled order, if one exists.
    pub async fn invoice_for(&self, order_id: &str) -> DbResult<Option<Invoice>> {
        let invoice: Option<Invoice> = sqlx::query_as(
            r#"
            SELECT id, order_id, original_total_cents, discount_cents,
                   promotion_id, final_total_cents, method, issued_at
            FROM invoices
            WHERE order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    fn spawn_receipt(&self, invoice: &Invoice) {
        let Some(printer) = self.printer.clone() else {
            return;
        };
        let invoice = invoice.clone();
        tokio::spawn(async move {
            if let Err(e) = printer.print(&invoice) {
                warn!(invoice_id = %invoice.id, error = %e, "Receipt print failed");
            }
        });
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn check_settleable(order: &Order) -> DbResult<()> {
    if order.status == OrderStatus::Paid {
        return Err(CoreError::OrderAlreadyPaid(order.id.clone()).into());
    }
    if !order.status.is_settleable() {
        return Err(CoreError::InvalidOrderStatus {
            order_id: order.id.clone(),
            current_status: format!("{:?}", order.status).to_lowercase(),
        }
        .into());
    }
    Ok(())
}

async fn resolve_code(
    conn: &mut SqliteConnection,
    promo_code: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<Option<Promotion>> {
    match promo_code {
        Some(code) => promotion::find_valid_by_code(conn, code, now).await,
        None => Ok(None),
    }
}

fn new_transaction(
    order_id: &str,
    method: PaymentMethod,
    tendered: Money,
    quote: &Quote,
    status: TxStatus,
    now: DateTime<Utc>,
) -> SettlementTx {
    SettlementTx {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        method,
        amount_tendered_cents: tendered.cents(),
        amount_due_cents: quote.amount_due.cents(),
        status,
        promotion_id: quote.promotion_id.clone(),
        discount_cents: quote.discount.cents(),
        created_at: now,
    }
}

async fn insert_transaction(conn: &mut SqliteConnection, record: &SettlementTx) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO settlement_transactions (
            id, order_id, method, amount_tendered_cents, amount_due_cents,
            status, promotion_id, discount_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&record.id)
    .bind(&record.order_id)
    .bind(record.method)
    .bind(record.amount_tendered_cents)
    .bind(record.amount_due_cents)
    .bind(record.status)
    .bind(&record.promotion_id)
    .bind(record.discount_cents)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, order_id, original_total_cents, discount_cents,
            promotion_id, final_total_cents, method, issued_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.order_id)
    .bind(invoice.original_total_cents)
    .bind(invoice.discount_cents)
    .bind(&invoice.promotion_id)
    .bind(invoice.final_total_cents)
    .bind(invoice.method)
    .bind(invoice.issued_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{order_totaling, seed_percent_promo, test_db};
    use comanda_core::{DiscountKind, TableStatus};
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_percent_promo_settles_discounted_total() {
        // 100.00 order, SAVE20 at 20%, 80.00 cash tendered
        let db = test_db().await;
        let order = order_totaling(&db, 10_000).await;
        seed_percent_promo(&db, "SAVE20", 2_000).await;

        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(8_000), Some("SAVE20"))
            .await
            .unwrap();

        assert!(outcome.is_success());
        let invoice = outcome.invoice.unwrap();
        assert_eq!(invoice.original_total_cents, 10_000);
        assert_eq!(invoice.discount_cents, 2_000);
        assert_eq!(invoice.final_total_cents, 8_000);
        assert!(invoice.promotion_id.is_some());

        let order = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total_cents, 8_000);
        assert_eq!(order.promotion_id, invoice.promotion_id);
    }

    #[tokio::test]
    async fn test_flat_promo_clamps_to_order_total() {
        // FLAT100 worth 100.00 on a 50.00 order -> free, never negative
        let db = test_db().await;
        let order = order_totaling(&db, 5_000).await;

        let now = Utc::now();
        db.promotions()
            .insert(
                "Flat Hundred",
                "FLAT100",
                DiscountKind::Flat,
                10_000,
                now - chrono::Duration::days(1),
                now + chrono::Duration::days(1),
                &[],
            )
            .await
            .unwrap();

        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::zero(), Some("FLAT100"))
            .await
            .unwrap();

        assert!(outcome.is_success());
        let invoice = outcome.invoice.unwrap();
        assert_eq!(invoice.discount_cents, 5_000);
        assert_eq!(invoice.final_total_cents, 0);
    }

    #[tokio::test]
    async fn test_short_cash_records_failed_transaction() {
        // 60.00 order, 50.00 tendered -> Failed tx, order untouched
        let db = test_db().await;
        let order = order_totaling(&db, 6_000).await;

        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(5_000), None)
            .await
            .unwrap();

        assert!(!outcome.is_success());
        assert!(outcome.invoice.is_none());
        assert_eq!(outcome.shortfall().unwrap().cents(), 1_000);
        assert_eq!(outcome.transaction.status, TxStatus::Failed);

        let order = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 6_000);
        assert!(db.settlement().invoice_for(&order.id).await.unwrap().is_none());

        // The failed attempt is on the audit trail
        let txs = db.settlement().transactions(&order.id).await.unwrap();
        assert_eq!(txs.len(), 1);

        // A covering second attempt succeeds
        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(6_000), None)
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(
            db.settlement().transactions(&order.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_unknown_code_settles_at_full_price() {
        // 30.00 order, code XYZ does not exist -> full price, no promo ref
        let db = test_db().await;
        let order = order_totaling(&db, 3_000).await;

        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Card, Money::zero(), Some("XYZ"))
            .await
            .unwrap();

        assert!(outcome.is_success());
        let invoice = outcome.invoice.unwrap();
        assert_eq!(invoice.final_total_cents, 3_000);
        assert_eq!(invoice.discount_cents, 0);
        assert!(invoice.promotion_id.is_none());
    }

    #[tokio::test]
    async fn test_blank_code_settles_at_full_price() {
        // An empty code box submits as "" and means no code at all
        let db = test_db().await;
        let order = order_totaling(&db, 3_000).await;

        let quote = db.settlement().preview(&order.id, Some("  ")).await.unwrap();
        assert_eq!(quote.amount_due.cents(), 3_000);
        assert!(quote.promotion_id.is_none());

        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(3_000), Some(""))
            .await
            .unwrap();

        assert!(outcome.is_success());
        let invoice = outcome.invoice.unwrap();
        assert_eq!(invoice.final_total_cents, 3_000);
        assert_eq!(invoice.discount_cents, 0);
        assert!(invoice.promotion_id.is_none());
    }

    #[tokio::test]
    async fn test_card_and_qr_capture_exactly_due() {
        let db = test_db().await;
        let order = order_totaling(&db, 4_500).await;

        // Tendered value is irrelevant for exact-capture methods
        let outcome = db
            .settlement()
            .settle(&order.id, PaymentMethod::Qr, Money::zero(), None)
            .await
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(outcome.transaction.amount_tendered_cents, 4_500);
        assert_eq!(outcome.transaction.amount_due_cents, 4_500);
    }

    #[tokio::test]
    async fn test_double_apply_rejected_without_audit_row() {
        let db = test_db().await;
        let order = order_totaling(&db, 10_000).await;
        seed_percent_promo(&db, "SAVE20", 2_000).await;
        seed_percent_promo(&db, "TEN", 1_000).await;

        db.settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(8_000), Some("SAVE20"))
            .await
            .unwrap();
        let before = db.settlement().transactions(&order.id).await.unwrap().len();

        let err = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(8_000), Some("TEN"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicatePromotion { .. })
        ));

        let after = db.settlement().transactions(&order.id).await.unwrap().len();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_settle_paid_order_rejected() {
        let db = test_db().await;
        let order = order_totaling(&db, 2_000).await;

        db.settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(2_000), None)
            .await
            .unwrap();

        let err = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(2_000), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderAlreadyPaid(_))));
    }

    #[tokio::test]
    async fn test_settle_cancelled_order_rejected() {
        let db = test_db().await;
        let order = order_totaling(&db, 2_000).await;
        db.orders().cancel(&order.id).await.unwrap();

        let err = db
            .settlement()
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(2_000), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidOrderStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_preview_is_idempotent_and_never_mutates() {
        let db = test_db().await;
        let order = order_totaling(&db, 10_000).await;
        seed_percent_promo(&db, "SAVE20", 2_000).await;

        let first = db
            .settlement()
            .preview(&order.id, Some("SAVE20"))
            .await
            .unwrap();
        let second = db
            .settlement()
            .preview(&order.id, Some("SAVE20"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.amount_due.cents(), 8_000);

        // Nothing was written anywhere
        let order = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.promotion_id.is_none());
        assert!(db
            .settlement()
            .transactions(&order.id)
            .await
            .unwrap()
            .is_empty());

        // Preview with an unknown code quotes full price
        let quote = db.settlement().preview(&order.id, Some("XYZ")).await.unwrap();
        assert_eq!(quote.amount_due.cents(), 10_000);
        assert!(quote.promotion_id.is_none());
    }

    #[tokio::test]
    async fn test_settlement_frees_the_table() {
        let db = test_db().await;

        let table = db.tables().insert("T-01", 4).await.unwrap();
        let pho = db.menu().insert("Pho Bo", "Mains", 5_000).await.unwrap();
        let order = db
            .orders()
            .open_order(Some(&table.id), "waiter-1")
            .await
            .unwrap();
        db.orders().add_line(&order.id, &pho, 1, None).await.unwrap();

        db.settlement()
            .settle(&order.id, PaymentMethod::Card, Money::zero(), None)
            .await
            .unwrap();

        let table = db.tables().get_by_id(&table.id).await.unwrap().unwrap();
        assert_eq!(table.status, TableStatus::Available);
    }

    #[derive(Default)]
    struct RecordingPrinter {
        printed: Mutex<Vec<String>>,
        fail: bool,
    }

    impl ReceiptPrinter for RecordingPrinter {
        fn print(&self, invoice: &Invoice) -> Result<(), PrintError> {
            if self.fail {
                return Err(PrintError("printer offline".into()));
            }
            self.printed.lock().unwrap().push(invoice.order_id.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_receipt_printed_after_successful_settlement() {
        let db = test_db().await;
        let order = order_totaling(&db, 2_000).await;

        let printer = Arc::new(RecordingPrinter::default());
        let service = db.settlement_with_printer(printer.clone());

        service
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(2_000), None)
            .await
            .unwrap();

        // Printing is fire-and-forget; give the task a beat
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert_eq!(*printer.printed.lock().unwrap(), vec![order.id.clone()]);
    }

    #[tokio::test]
    async fn test_printer_failure_does_not_affect_settlement() {
        let db = test_db().await;
        let order = order_totaling(&db, 2_000).await;

        let printer = Arc::new(RecordingPrinter {
            fail: true,
            ..Default::default()
        });
        let service = db.settlement_with_printer(printer);

        let outcome = service
            .settle(&order.id, PaymentMethod::Cash, Money::from_cents(2_000), None)
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(outcome.is_success());
        let order = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }
}
