//! # Cancellation Engine
//!
//! Atomically reverses a settled sale: stock returns, return movements are
//! appended, and the sale's status flips to CANCELLED.
//!
//! ## What Cancellation Never Does
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cancellation touches exactly three things:                             │
//! │                                                                         │
//! │    1. sales.status        completed → cancelled (guarded, one-way)      │
//! │    2. products.quantity   + item.quantity per line                      │
//! │    3. movements           one IN entry (return) per line, tagged        │
//! │                           with the sale id                              │
//! │                                                                         │
//! │  It never deletes or edits sale items, and never changes the stored     │
//! │  total. The sale remains fully auditable after reversal.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, EngineResult};
use crate::pool::Database;
use crate::repository::movement::MovementRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use ledgerpos_core::{CoreError, Movement, MovementKind, Sale, SaleStatus};

/// Orchestrates the atomic sale reversal.
#[derive(Debug, Clone)]
pub struct CancellationEngine {
    db: Database,
}

impl CancellationEngine {
    /// Creates a new CancellationEngine on top of a database handle.
    pub fn new(db: Database) -> Self {
        CancellationEngine { db }
    }

    /// Cancels a COMPLETED sale.
    ///
    /// ## Algorithm (one transaction)
    /// 1. Load the sale, scoped to the tenant (`SaleNotFound` if absent)
    /// 2. Reject if already CANCELLED (`AlreadyCancelled`; a second
    ///    cancellation is a user error, not a silent no-op)
    /// 3. Guarded status flip (`WHERE status = 'completed'`); a losing
    ///    racer surfaces as `AlreadyCancelled` too
    /// 4. Per item: increment the product's stock and append an IN
    ///    movement (return) tagged with the sale id
    /// 5. Commit; on any failure everything rolls back and the sale stays
    ///    COMPLETED
    pub async fn cancel(&self, tenant_id: &str, sale_id: &str) -> EngineResult<Sale> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale = SaleRepository::get_by_id_tx(tx.as_mut(), tenant_id, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if sale.status == SaleStatus::Cancelled {
            return Err(CoreError::AlreadyCancelled(sale_id.to_string()).into());
        }

        if !SaleRepository::mark_cancelled(tx.as_mut(), tenant_id, sale_id).await? {
            // Lost a race against another cancellation of the same sale.
            return Err(CoreError::AlreadyCancelled(sale_id.to_string()).into());
        }

        let items = SaleRepository::get_items_tx(tx.as_mut(), sale_id).await?;
        let now = Utc::now();

        for item in &items {
            ProductRepository::increment_stock(
                tx.as_mut(),
                tenant_id,
                &item.product_id,
                item.quantity,
            )
            .await?;

            MovementRepository::append(
                tx.as_mut(),
                &Movement {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: tenant_id.to_string(),
                    product_id: item.product_id.clone(),
                    kind: MovementKind::In,
                    quantity: item.quantity,
                    sale_id: Some(sale_id.to_string()),
                    created_at: now,
                },
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %tenant_id,
            sale_id = %sale_id,
            items = items.len(),
            "Sale cancelled"
        );

        Ok(Sale {
            status: SaleStatus::Cancelled,
            ..sale
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::settlement::SettlementEngine;
    use crate::error::EngineError;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{cart, cart_line, product};

    async fn settled_sale(db: &Database) -> (String, Sale) {
        let p = product("t1", "Ground Coffee 500g", 1000, 10);
        db.products().insert(&p).await.unwrap();

        let sale = SettlementEngine::new(db.clone())
            .settle("t1", &cart(vec![cart_line(&p.id, 2, 1000)], 2000))
            .await
            .unwrap();
        (p.id, sale)
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_ledger() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (product_id, sale) = settled_sale(&db).await;

        let cancelled = CancellationEngine::new(db.clone())
            .cancel("t1", &sale.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        // Total untouched by reversal
        assert_eq!(cancelled.total_cents, 2000);

        // Stock back to 10
        let p = db
            .products()
            .get_by_id("t1", &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.quantity, 10);

        // One OUT from settlement, one IN from cancellation, same sale tag
        let movements = db.movements().list_for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert!(movements.iter().any(|m| m.kind == MovementKind::Out));
        assert!(movements.iter().any(|m| m.kind == MovementKind::In));

        // Items survive reversal untouched
        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_cancel_twice_rejected_and_stock_restored_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (product_id, sale) = settled_sale(&db).await;

        let engine = CancellationEngine::new(db.clone());
        engine.cancel("t1", &sale.id).await.unwrap();

        let err = engine.cancel("t1", &sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::AlreadyCancelled(_))
        ));

        // Incremented exactly once
        let p = db
            .products()
            .get_by_id("t1", &product_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.quantity, 10);
        assert_eq!(
            db.movements().list_for_sale("t1", &sale.id).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_cancel_unknown_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = CancellationEngine::new(db.clone())
            .cancel("t1", "no-such-sale")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::SaleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_scoped_to_tenant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (_, sale) = settled_sale(&db).await;

        // Another tenant cannot cancel t1's sale
        let err = CancellationEngine::new(db.clone())
            .cancel("t2", &sale.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::SaleNotFound(_))
        ));

        let still = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(still.status, SaleStatus::Completed);
    }
}
