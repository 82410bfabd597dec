//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  How Stock Changes (and how it doesn't)                 │
//! │                                                                         │
//! │  ❌ WRONG: read quantity, compute, write absolute value                 │
//! │     let p = get_by_id(...);                                             │
//! │     update_quantity(p.quantity - 3)   ← races with concurrent sellers  │
//! │                                                                         │
//! │  ✅ CORRECT: guarded relative update inside the transaction             │
//! │     UPDATE products SET quantity = quantity - 3                         │
//! │     WHERE id = ? AND tenant_id = ? AND quantity >= 3                    │
//! │                                                                         │
//! │  rows_affected == 0 means the stock ran out between the availability    │
//! │  check and the write; the engine maps that to InsufficientStock and     │
//! │  the transaction rolls back.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use ledgerpos_core::Product;

const SELECT_COLUMNS: &str = "id, tenant_id, name, category, price_cents, quantity, created_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, scoped to the tenant.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found and owned by the tenant
    /// * `Ok(None)` - No such product for this tenant
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products for a tenant, ordered by name.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE tenant_id = ?1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// Catalog management is a collaborator of the core; this insert
    /// exists so the engines have products to operate on and so tests
    /// can seed a catalog.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, tenant_id, name, category, price_cents, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Transactional variants (called by the engines inside a transaction)
    // =========================================================================

    /// Reads a product inside an open transaction, scoped to the tenant.
    ///
    /// Settlement uses this for the availability pre-check and to freeze
    /// nothing: the authoritative check happens at decrement time.
    pub async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {SELECT_COLUMNS} FROM products WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Attempts a guarded stock decrement inside an open transaction.
    ///
    /// The `quantity >= ?` guard re-validates availability at write time,
    /// on the same row the write touches. A plain read-then-write would
    /// let two concurrent settlements both pass a stale check.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock was decremented
    /// * `Ok(false)` - Not enough stock (or product vanished); nothing changed
    pub async fn try_decrement_stock(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(id = %id, quantity = %quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity - ?3
            WHERE tenant_id = ?1 AND id = ?2 AND quantity >= ?3
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(quantity)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Increments stock inside an open transaction.
    ///
    /// Used by cancellation (returns) and manual IN adjustments; an
    /// increment cannot violate the non-negativity invariant, so the only
    /// failure mode is a missing product.
    pub async fn increment_stock(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Incrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?3
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(quantity)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::product;

    #[tokio::test]
    async fn test_insert_and_get_scoped_by_tenant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = product("t1", "Espresso Beans 1kg", 4500, 10);
        repo.insert(&p).await.unwrap();

        let found = repo.get_by_id("t1", &p.id).await.unwrap();
        assert_eq!(found.unwrap().quantity, 10);

        // Another tenant cannot see it
        let hidden = repo.get_by_id("t2", &p.id).await.unwrap();
        assert!(hidden.is_none());
    }

    #[tokio::test]
    async fn test_guarded_decrement() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let p = product("t1", "Milk 1L", 350, 5);
        repo.insert(&p).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert!(
            ProductRepository::try_decrement_stock(tx.as_mut(), "t1", &p.id, 3)
                .await
                .unwrap()
        );
        // Only 2 left now; a further 3 must be refused
        assert!(
            !ProductRepository::try_decrement_stock(tx.as_mut(), "t1", &p.id, 3)
                .await
                .unwrap()
        );
        tx.commit().await.unwrap();

        let found = repo.get_by_id("t1", &p.id).await.unwrap().unwrap();
        assert_eq!(found.quantity, 2);
    }

    #[tokio::test]
    async fn test_increment_missing_product_fails() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        let err = ProductRepository::increment_stock(tx.as_mut(), "t1", "ghost", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
