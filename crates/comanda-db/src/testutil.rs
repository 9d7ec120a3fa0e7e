//! Shared helpers for the crate's async database tests.

use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

use crate::pool::{Database, DbConfig};
use comanda_core::{DiscountKind, Order, Promotion};

/// Installs a subscriber so `RUST_LOG=debug cargo test` shows the crate's
/// tracing output. Only the first call per process wins.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A fresh, fully migrated in-memory database.
pub(crate) async fn test_db() -> Database {
    init_tracing();
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// A pending order holding a single line whose total is `total_cents`.
pub(crate) async fn order_totaling(db: &Database, total_cents: i64) -> Order {
    let item = db
        .menu()
        .insert("Set Menu", "Mains", total_cents)
        .await
        .expect("menu item");
    let order = db
        .orders()
        .open_order(None, "waiter-1")
        .await
        .expect("order");
    db.orders()
        .add_line(&order.id, &item, 1, None)
        .await
        .expect("order line");

    db.orders()
        .get_by_id(&order.id)
        .await
        .expect("reload")
        .expect("order exists")
}

/// An active whole-order percent promotion valid around now.
pub(crate) async fn seed_percent_promo(db: &Database, code: &str, bps: i64) -> Promotion {
    let now = Utc::now();
    db.promotions()
        .insert(
            code,
            code,
            DiscountKind::Percent,
            bps,
            now - Duration::days(1),
            now + Duration::days(1),
            &[],
        )
        .await
        .expect("promotion")
}
