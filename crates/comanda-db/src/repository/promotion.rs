//! # Promotion Repository
//!
//! Database operations for promotions and promo code resolution.
//!
//! ## Code Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  find_valid_by_code("SAVE20", now)                      │
//! │                                                                         │
//! │  SELECT ... WHERE code = 'SAVE20'                                       │
//! │             AND is_active = 1                                           │
//! │             AND starts_at <= now AND ends_at >= now                     │
//! │       │                                                                 │
//! │       ├── No row → Ok(None)    (unknown/expired codes are not errors)   │
//! │       │                                                                 │
//! │       └── Row → load eligible item ids from the link table              │
//! │                 (empty set = promotion covers the whole order)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use comanda_core::validation::{validate_discount_bps, validate_promo_code};
use comanda_core::{CoreError, DiscountKind, Promotion, ValidationError};

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    /// Creates a new PromotionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    /// Inserts a new promotion together with its eligible item links.
    ///
    /// `eligible_item_ids` empty means the promotion applies to the whole
    /// order.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        name: &str,
        code: &str,
        discount_kind: DiscountKind,
        discount_value: i64,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        eligible_item_ids: &[String],
    ) -> DbResult<Promotion> {
        validate_promo_code(code).map_err(CoreError::from)?;
        match discount_kind {
            DiscountKind::Percent => {
                validate_discount_bps(discount_value).map_err(CoreError::from)?
            }
            DiscountKind::Flat => {
                if discount_value < 0 {
                    return Err(CoreError::from(ValidationError::MustBePositive {
                        field: "discount".to_string(),
                    })
                    .into());
                }
            }
        }
        if starts_at > ends_at {
            return Err(CoreError::from(ValidationError::InvertedDateRange).into());
        }

        let now = Utc::now();
        let promo = Promotion {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            code: code.trim().to_string(),
            discount_kind,
            discount_value,
            starts_at,
            ends_at,
            is_active: true,
            eligible_item_ids: eligible_item_ids.to_vec(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %promo.id, code = %promo.code, "Inserting promotion");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, name, code, discount_kind, discount_value,
                starts_at, ends_at, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&promo.id)
        .bind(&promo.name)
        .bind(&promo.code)
        .bind(promo.discount_kind)
        .bind(promo.discount_value)
        .bind(promo.starts_at)
        .bind(promo.ends_at)
        .bind(promo.is_active)
        .bind(promo.created_at)
        .bind(promo.updated_at)
        .execute(&mut *tx)
        .await?;

        for item_id in &promo.eligible_item_ids {
            sqlx::query(
                r#"
                INSERT INTO promotion_items (promotion_id, menu_item_id)
                VALUES (?1, ?2)
                "#,
            )
            .bind(&promo.id)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(promo)
    }

    /// Gets a promotion by code regardless of validity, eligible ids loaded.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        let promo: Option<Promotion> = sqlx::query_as(
            r#"
            SELECT id, name, code, discount_kind, discount_value,
                   starts_at, ends_at, is_active, created_at, updated_at
            FROM promotions
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut promo) = promo else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        promo.eligible_item_ids = load_eligible_item_ids(&mut conn, &promo.id).await?;
        Ok(Some(promo))
    }

    /// Resolves a promo code to a usable promotion at `now`.
    ///
    /// Returns `Ok(None)` for unknown, inactive, or out-of-window codes.
    /// Checkout treats that as "no discount", never as an error.
    pub async fn find_valid_by_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Promotion>> {
        let mut conn = self.pool.acquire().await?;
        find_valid_by_code(&mut conn, code, now).await
    }

    /// Deactivates a promotion; the code stops resolving immediately.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE promotions SET is_active = 0, updated_at = ?2
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(crate::error::DbError::not_found("Promotion", id));
        }

        Ok(())
    }
}

/// Connection-level code resolution, shared with the settlement service so
/// it can resolve the code inside its own transaction.
pub(crate) async fn find_valid_by_code(
    conn: &mut SqliteConnection,
    code: &str,
    now: DateTime<Utc>,
) -> DbResult<Option<Promotion>> {
    let promo: Option<Promotion> = sqlx::query_as(
        r#"
        SELECT id, name, code, discount_kind, discount_value,
               starts_at, ends_at, is_active, created_at, updated_at
        FROM promotions
        WHERE code = ?1 AND is_active = 1 AND starts_at <= ?2 AND ends_at >= ?2
        "#,
    )
    .bind(code)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(mut promo) = promo else {
        return Ok(None);
    };

    promo.eligible_item_ids = load_eligible_item_ids(conn, &promo.id).await?;
    Ok(Some(promo))
}

async fn load_eligible_item_ids(
    conn: &mut SqliteConnection,
    promotion_id: &str,
) -> DbResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT menu_item_id FROM promotion_items
        WHERE promotion_id = ?1
        ORDER BY menu_item_id
        "#,
    )
    .bind(promotion_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
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
    async fn test_insert_and_resolve() {
        let db = test_db().await;
        let now = Utc::now();

        db.promotions()
            .insert(
                "Twenty Off",
                "SAVE20",
                DiscountKind::Percent,
                2_000,
                now - Duration::days(1),
                now + Duration::days(1),
                &[],
            )
            .await
            .unwrap();

        let found = db
            .promotions()
            .find_valid_by_code("SAVE20", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.code, "SAVE20");
        assert!(found.eligible_item_ids.is_empty());

        // Unknown codes resolve to None, not an error
        let missing = db.promotions().find_valid_by_code("XYZ", now).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_window_and_active_flag_gate_resolution() {
        let db = test_db().await;
        let now = Utc::now();

        let promo = db
            .promotions()
            .insert(
                "Expired",
                "OLD10",
                DiscountKind::Flat,
                1_000,
                now - Duration::days(10),
                now - Duration::days(5),
                &[],
            )
            .await
            .unwrap();

        assert!(db
            .promotions()
            .find_valid_by_code("OLD10", now)
            .await
            .unwrap()
            .is_none());
        // Within its own window it resolves
        assert!(db
            .promotions()
            .find_valid_by_code("OLD10", now - Duration::days(7))
            .await
            .unwrap()
            .is_some());

        db.promotions().deactivate(&promo.id).await.unwrap();
        assert!(db
            .promotions()
            .find_valid_by_code("OLD10", now - Duration::days(7))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_eligible_items_round_trip() {
        let db = test_db().await;
        let now = Utc::now();

        let pho = db.menu().insert("Pho Bo", "Mains", 5_000).await.unwrap();
        db.promotions()
            .insert(
                "Pho Deal",
                "PHO50",
                DiscountKind::Percent,
                5_000,
                now - Duration::days(1),
                now + Duration::days(1),
                &[pho.id.clone()],
            )
            .await
            .unwrap();

        let found = db
            .promotions()
            .get_by_code("PHO50")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.eligible_item_ids, vec![pho.id]);
    }

    #[tokio::test]
    async fn test_validation_rejections() {
        let db = test_db().await;
        let now = Utc::now();

        // Percent over 100%
        let err = db
            .promotions()
            .insert(
                "Too Big",
                "BIG",
                DiscountKind::Percent,
                10_001,
                now,
                now + Duration::days(1),
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        // Inverted window
        let err = db
            .promotions()
            .insert(
                "Backwards",
                "BACK",
                DiscountKind::Flat,
                100,
                now + Duration::days(1),
                now,
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        // Duplicate code
        db.promotions()
            .insert(
                "First",
                "DUP",
                DiscountKind::Flat,
                100,
                now,
                now + Duration::days(1),
                &[],
            )
            .await
            .unwrap();
        let err = db
            .promotions()
            .insert(
                "Second",
                "DUP",
                DiscountKind::Flat,
                200,
                now,
                now + Duration::days(1),
                &[],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
