//! # Settlement Engine
//!
//! Atomically converts a cart into a persisted sale, decremented stock and
//! an append-only ledger entry per line item.
//!
//! ## Why Two Availability Checks?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              The Race This Module Exists To Prevent                     │
//! │                                                                         │
//! │  Product P: quantity = 5                                                │
//! │                                                                         │
//! │  Terminal A: settle(qty: 3) ──┐                                        │
//! │  Terminal B: settle(qty: 3) ──┤ concurrent                             │
//! │                               │                                         │
//! │  Naive read-then-write: both read 5, both pass "5 >= 3",              │
//! │  both write ⇒ quantity = -1  ❌                                        │
//! │                                                                         │
//! │  Here: the pre-check inside the transaction gives a precise error      │
//! │  early, and the guarded decrement                                      │
//! │     UPDATE ... SET quantity = quantity - 3 WHERE ... AND quantity >= 3 │
//! │  re-validates on the row itself at write time. One terminal commits    │
//! │  (quantity = 2), the other rolls back with InsufficientStock. ✅       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, EngineResult};
use crate::pool::Database;
use crate::repository::client::ClientRepository;
use crate::repository::movement::MovementRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use ledgerpos_core::{
    validation::validate_cart, Cart, CoreError, Movement, MovementKind, Sale, SaleItem,
    SaleStatus, ValidationError,
};

/// Orchestrates the atomic sale commit.
///
/// Holds an injected [`Database`] handle; cloning is cheap (the pool is
/// reference-counted), so one engine per caller or one shared engine both
/// work.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    db: Database,
}

impl SettlementEngine {
    /// Creates a new SettlementEngine on top of a database handle.
    pub fn new(db: Database) -> Self {
        SettlementEngine { db }
    }

    /// Settles a cart into a COMPLETED sale.
    ///
    /// ## Algorithm (one transaction)
    /// 1. Structural validation (pure, before any database work)
    /// 2. Client membership check, when the cart names a client
    /// 3. Product resolution + availability pre-check on the current
    ///    snapshot read within this transaction
    /// 4. Per-tenant sequence assignment (`MAX + 1`)
    /// 5. Sale + item inserts
    /// 6. Guarded stock decrement and OUT-movement append per item
    /// 7. Commit
    ///
    /// ## Errors
    /// `ValidationError`, `ClientNotFound`, `ProductNotFound` and
    /// `InsufficientStock` all leave state untouched and are safe to retry
    /// after adjusting the cart. Database-level failures roll back too and
    /// may be retried unchanged.
    pub async fn settle(&self, tenant_id: &str, cart: &Cart) -> EngineResult<Sale> {
        validate_cart(cart)?;

        debug!(tenant_id = %tenant_id, items = cart.items.len(), "Settling cart");

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        if let Some(client_id) = &cart.client_id {
            if !ClientRepository::exists_tx(tx.as_mut(), tenant_id, client_id).await? {
                return Err(CoreError::ClientNotFound(client_id.clone()).into());
            }
        }

        // Existence + availability against the snapshot inside this
        // transaction. Precise errors come from here; correctness comes
        // from the guarded decrement below.
        for item in &cart.items {
            let product =
                ProductRepository::get_by_id_tx(tx.as_mut(), tenant_id, &item.product_id)
                    .await?
                    .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if product.quantity < item.quantity {
                return Err(CoreError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    available: product.quantity,
                    requested: item.quantity,
                }
                .into());
            }
        }

        let sequence = SaleRepository::next_sequence(tx.as_mut(), tenant_id).await?;
        let now = Utc::now();

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            sequence,
            status: SaleStatus::Completed,
            total_cents: cart.total_cents,
            discount_cents: cart.discount_cents,
            payment_method: cart.payment_method,
            client_id: cart.client_id.clone(),
            created_at: now,
        };

        SaleRepository::insert_sale(tx.as_mut(), &sale).await?;

        for item in &cart.items {
            let sale_item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price_cents: item.unit_price_cents,
                discount_cents: item.discount_cents,
                line_total_cents: item.line_total().cents(),
                created_at: now,
            };
            SaleRepository::insert_item(tx.as_mut(), &sale_item).await?;

            // Guarded decrement: re-validates availability at write time,
            // so racing settlements cannot jointly oversell.
            let decremented = ProductRepository::try_decrement_stock(
                tx.as_mut(),
                tenant_id,
                &item.product_id,
                item.quantity,
            )
            .await?;

            if !decremented {
                let available =
                    ProductRepository::get_by_id_tx(tx.as_mut(), tenant_id, &item.product_id)
                        .await?
                        .map(|p| p.quantity)
                        .unwrap_or(0);
                return Err(CoreError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    available,
                    requested: item.quantity,
                }
                .into());
            }

            MovementRepository::append(
                tx.as_mut(),
                &Movement {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: tenant_id.to_string(),
                    product_id: item.product_id.clone(),
                    kind: MovementKind::Out,
                    quantity: item.quantity,
                    sale_id: Some(sale.id.clone()),
                    created_at: now,
                },
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %tenant_id,
            sale_id = %sale.id,
            sequence = %sale.sequence,
            total = %sale.total_cents,
            items = cart.items.len(),
            "Sale settled"
        );

        Ok(sale)
    }

    /// Records a manual stock adjustment (entry or exit).
    ///
    /// Manual movements follow the same pairing rule as settlement and
    /// cancellation: the stock delta and the ledger append commit together
    /// or not at all. OUT adjustments respect availability.
    pub async fn record_adjustment(
        &self,
        tenant_id: &str,
        product_id: &str,
        kind: MovementKind,
        quantity: i64,
    ) -> EngineResult<Movement> {
        if quantity < 1 {
            return Err(ValidationError::QuantityTooSmall {
                product_id: product_id.to_string(),
            }
            .into());
        }

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let product = ProductRepository::get_by_id_tx(tx.as_mut(), tenant_id, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        match kind {
            MovementKind::In => {
                ProductRepository::increment_stock(tx.as_mut(), tenant_id, product_id, quantity)
                    .await?;
            }
            MovementKind::Out => {
                let decremented = ProductRepository::try_decrement_stock(
                    tx.as_mut(),
                    tenant_id,
                    product_id,
                    quantity,
                )
                .await?;
                if !decremented {
                    return Err(CoreError::InsufficientStock {
                        product_id: product_id.to_string(),
                        available: product.quantity,
                        requested: quantity,
                    }
                    .into());
                }
            }
        }

        let movement = Movement {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            product_id: product_id.to_string(),
            kind,
            quantity,
            sale_id: None,
            created_at: Utc::now(),
        };
        MovementRepository::append(tx.as_mut(), &movement).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            tenant_id = %tenant_id,
            product_id = %product_id,
            kind = ?kind,
            quantity = %quantity,
            "Manual adjustment recorded"
        );

        Ok(movement)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{cart, cart_line, client, product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_settle_round_trip_effects() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let p = product("t1", "Ground Coffee 500g", 1000, 10);
        db.products().insert(&p).await.unwrap();

        let sale = engine
            .settle("t1", &cart(vec![cart_line(&p.id, 2, 1000)], 2000))
            .await
            .unwrap();

        assert_eq!(sale.sequence, 1);
        assert_eq!(sale.total_cents, 2000);
        assert_eq!(sale.status, SaleStatus::Completed);

        // Stock decremented
        let p_after = db.products().get_by_id("t1", &p.id).await.unwrap().unwrap();
        assert_eq!(p_after.quantity, 8);

        // One OUT movement, tagged with the sale
        let movements = db.movements().list_for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Out);
        assert_eq!(movements[0].quantity, 2);

        // Item snapshot persisted
        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 1000);
        assert_eq!(items[0].line_total_cents, 2000);
    }

    #[tokio::test]
    async fn test_sequence_is_monotone_and_per_tenant() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let p1 = product("t1", "Tea Box", 500, 100);
        let p2 = product("t2", "Tea Box", 500, 100);
        db.products().insert(&p1).await.unwrap();
        db.products().insert(&p2).await.unwrap();

        let c = cart(vec![cart_line(&p1.id, 1, 500)], 500);
        assert_eq!(engine.settle("t1", &c).await.unwrap().sequence, 1);
        assert_eq!(engine.settle("t1", &c).await.unwrap().sequence, 2);

        // Tenant 2 is independent
        let c2 = cart(vec![cart_line(&p2.id, 1, 500)], 500);
        assert_eq!(engine.settle("t2", &c2).await.unwrap().sequence, 1);
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_no_trace() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let err = engine
            .settle("t1", &cart(vec![cart_line("ghost", 1, 100)], 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::ProductNotFound(_))
        ));

        assert!(db.sales().list("t1").await.unwrap().is_empty());
        assert!(db.movements().list("t1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_atomic() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let a = product("t1", "Item A", 100, 10);
        let b = product("t1", "Item B", 100, 1);
        db.products().insert(&a).await.unwrap();
        db.products().insert(&b).await.unwrap();

        // First line would succeed, second must fail; nothing may stick.
        let err = engine
            .settle(
                "t1",
                &cart(
                    vec![cart_line(&a.id, 5, 100), cart_line(&b.id, 3, 100)],
                    800,
                ),
            )
            .await
            .unwrap_err();

        match err {
            EngineError::Domain(CoreError::InsufficientStock {
                product_id,
                available,
                requested,
            }) => {
                assert_eq!(product_id, b.id);
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // No sale, no items, no movements, no stock change
        assert!(db.sales().list("t1").await.unwrap().is_empty());
        assert!(db.movements().list("t1").await.unwrap().is_empty());
        let a_after = db.products().get_by_id("t1", &a.id).await.unwrap().unwrap();
        assert_eq!(a_after.quantity, 10);
    }

    #[tokio::test]
    async fn test_unknown_client_rejected() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let p = product("t1", "Item", 100, 5);
        db.products().insert(&p).await.unwrap();

        let mut c = cart(vec![cart_line(&p.id, 1, 100)], 100);
        c.client_id = Some("nobody".to_string());

        let err = engine.settle("t1", &c).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::ClientNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_client_from_another_tenant_rejected() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let p = product("t1", "Item", 100, 5);
        db.products().insert(&p).await.unwrap();
        let foreign = client("t2", "Jo Lima");
        db.clients().insert(&foreign).await.unwrap();

        let mut c = cart(vec![cart_line(&p.id, 1, 100)], 100);
        c.client_id = Some(foreign.id.clone());

        let err = engine.settle("t1", &c).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::ClientNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_cart_is_validation_error() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let err = engine.settle("t1", &cart(vec![], 0)).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(ValidationError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_settlements_cannot_oversell() {
        let db = test_db().await;

        let p = product("t1", "Scarce Item", 100, 5);
        db.products().insert(&p).await.unwrap();

        let engine_a = SettlementEngine::new(db.clone());
        let engine_b = SettlementEngine::new(db.clone());
        let cart_a = cart(vec![cart_line(&p.id, 3, 100)], 300);
        let cart_b = cart(vec![cart_line(&p.id, 3, 100)], 300);

        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { engine_a.settle("t1", &cart_a).await }),
            tokio::spawn(async move { engine_b.settle("t1", &cart_b).await }),
        );
        let ra = ra.unwrap();
        let rb = rb.unwrap();

        // Exactly one succeeds, the other sees InsufficientStock
        assert_eq!(ra.is_ok() as u8 + rb.is_ok() as u8, 1);
        for r in [ra, rb] {
            if let Err(e) = r {
                assert!(matches!(
                    e,
                    EngineError::Domain(CoreError::InsufficientStock { .. })
                ));
            }
        }

        let p_after = db.products().get_by_id("t1", &p.id).await.unwrap().unwrap();
        assert_eq!(p_after.quantity, 2);
    }

    #[tokio::test]
    async fn test_manual_adjustments_pair_with_ledger() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        let p = product("t1", "Beans", 700, 0);
        db.products().insert(&p).await.unwrap();

        engine
            .record_adjustment("t1", &p.id, MovementKind::In, 10)
            .await
            .unwrap();
        engine
            .record_adjustment("t1", &p.id, MovementKind::Out, 4)
            .await
            .unwrap();

        let p_after = db.products().get_by_id("t1", &p.id).await.unwrap().unwrap();
        assert_eq!(p_after.quantity, 6);
        assert_eq!(
            db.movements().reconciled_quantity("t1", &p.id).await.unwrap(),
            6
        );

        // OUT beyond stock refused, nothing recorded
        let err = engine
            .record_adjustment("t1", &p.id, MovementKind::Out, 99)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(db.movements().list_for_product("t1", &p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ledger_reconciliation_after_settlement() {
        let db = test_db().await;
        let engine = SettlementEngine::new(db.clone());

        // Stock enters through the ledger, so reconciliation holds from zero.
        let p = product("t1", "Cups", 250, 0);
        db.products().insert(&p).await.unwrap();
        engine
            .record_adjustment("t1", &p.id, MovementKind::In, 12)
            .await
            .unwrap();

        engine
            .settle("t1", &cart(vec![cart_line(&p.id, 5, 250)], 1250))
            .await
            .unwrap();

        let p_after = db.products().get_by_id("t1", &p.id).await.unwrap().unwrap();
        let reconciled = db.movements().reconciled_quantity("t1", &p.id).await.unwrap();
        assert_eq!(p_after.quantity, 7);
        assert_eq!(reconciled, p_after.quantity);
    }
}
