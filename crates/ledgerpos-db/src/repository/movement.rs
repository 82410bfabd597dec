//! # Movement Repository
//!
//! The append-only stock ledger.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     The Ledger Is Append-Only                           │
//! │                                                                         │
//! │  This repository exposes exactly one write: append().                   │
//! │  There is no update, no delete, anywhere in the workspace.             │
//! │                                                                         │
//! │  Every append travels with the matching stock delta inside the same    │
//! │  transaction (settlement, cancellation, manual adjustment), so the     │
//! │  ledger always reconciles:                                             │
//! │                                                                         │
//! │      product.quantity == Σ(IN.quantity) − Σ(OUT.quantity)              │
//! │                                                                         │
//! │  reconciled_quantity() computes the right-hand side for audits and     │
//! │  tests.                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use ledgerpos_core::{Movement, MovementKind};

/// A ledger entry joined with its product's name, for reports and audit
/// views.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MovementWithProduct {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub product_name: String,
    pub kind: MovementKind,
    pub quantity: i64,
    pub sale_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Repository for the movement ledger.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Appends a ledger entry inside an open transaction.
    ///
    /// The only write this repository has. Callers pair it with the
    /// matching stock delta in the same transaction.
    pub async fn append(conn: &mut SqliteConnection, movement: &Movement) -> DbResult<()> {
        debug!(
            product_id = %movement.product_id,
            kind = ?movement.kind,
            quantity = %movement.quantity,
            "Appending movement"
        );

        sqlx::query(
            r#"
            INSERT INTO movements (id, tenant_id, product_id, kind, quantity, sale_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.tenant_id)
        .bind(&movement.product_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(&movement.sale_id)
        .bind(movement.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Lists a tenant's movements, newest first, joined with product names.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<MovementWithProduct>> {
        let movements = sqlx::query_as::<_, MovementWithProduct>(
            r#"
            SELECT
                m.id, m.tenant_id, m.product_id, p.name AS product_name,
                m.kind, m.quantity, m.sale_id, m.created_at
            FROM movements m
            INNER JOIN products p ON p.id = m.product_id
            WHERE m.tenant_id = ?1
            ORDER BY m.created_at DESC, m.id
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists the movements of a single product, oldest first.
    pub async fn list_for_product(
        &self,
        tenant_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, tenant_id, product_id, kind, quantity, sale_id, created_at
            FROM movements
            WHERE tenant_id = ?1 AND product_id = ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists the movements produced by one sale (its causal group).
    pub async fn list_for_sale(&self, tenant_id: &str, sale_id: &str) -> DbResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, tenant_id, product_id, kind, quantity, sale_id, created_at
            FROM movements
            WHERE tenant_id = ?1 AND sale_id = ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Reconstructs a product's quantity from the ledger alone:
    /// Σ(IN) − Σ(OUT) since tracking began.
    ///
    /// A product created with non-zero initial stock records that stock as
    /// an initial IN movement, so the reconciliation holds from creation.
    pub async fn reconciled_quantity(&self, tenant_id: &str, product_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN kind = 'in' THEN quantity ELSE -quantity END), 0)
            FROM movements
            WHERE tenant_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{movement, product};

    #[tokio::test]
    async fn test_append_and_reconcile() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let p = product("t1", "Sugar 1kg", 800, 0);
        db.products().insert(&p).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        MovementRepository::append(tx.as_mut(), &movement("t1", &p.id, MovementKind::In, 10))
            .await
            .unwrap();
        MovementRepository::append(tx.as_mut(), &movement("t1", &p.id, MovementKind::Out, 4))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let repo = db.movements();
        assert_eq!(repo.reconciled_quantity("t1", &p.id).await.unwrap(), 6);
        assert_eq!(repo.list_for_product("t1", &p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_joins_product_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let p = product("t1", "Flour 5kg", 1200, 0);
        db.products().insert(&p).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        MovementRepository::append(tx.as_mut(), &movement("t1", &p.id, MovementKind::In, 3))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let rows = db.movements().list("t1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].product_name, "Flour 5kg");
        assert!(rows[0].sale_id.is_none());
    }

    #[tokio::test]
    async fn test_tenants_are_isolated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let p = product("t1", "Salt", 200, 0);
        db.products().insert(&p).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        MovementRepository::append(tx.as_mut(), &movement("t1", &p.id, MovementKind::In, 5))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(db.movements().list("t2").await.unwrap().is_empty());
    }
}
