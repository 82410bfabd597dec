//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. SETTLE (settlement engine, one transaction)                         │
//! │     ├── next_sequence() → per-tenant sequence number                    │
//! │     ├── insert_sale()   → Sale { status: Completed }                    │
//! │     └── insert_item()   → SaleItem per cart line                        │
//! │                                                                         │
//! │  2. (OPTIONAL) CANCEL (cancellation engine, one transaction)            │
//! │     └── mark_cancelled() → Sale { status: Cancelled }                   │
//! │         (guarded: only flips a COMPLETED sale)                          │
//! │                                                                         │
//! │  Sale items are written once and never edited; cancellation touches    │
//! │  only the status column.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use ledgerpos_core::{Sale, SaleItem};

const SALE_COLUMNS: &str =
    "id, tenant_id, sequence, status, total_cents, discount_cents, payment_method, client_id, created_at";

/// A sale item joined with its product's name, for receipts and reports.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct SaleItemWithProduct {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub line_total_cents: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, scoped to the tenant.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists a tenant's sales, newest first.
    pub async fn list(&self, tenant_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 ORDER BY sequence DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets all items for a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents,
                   discount_cents, line_total_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all items for a sale joined with product names, for receipts
    /// and report views.
    pub async fn get_items_with_products(
        &self,
        sale_id: &str,
    ) -> DbResult<Vec<SaleItemWithProduct>> {
        let items = sqlx::query_as::<_, SaleItemWithProduct>(
            r#"
            SELECT
                i.id, i.sale_id, i.product_id, p.name AS product_name,
                i.quantity, i.unit_price_cents, i.discount_cents,
                i.line_total_cents, i.created_at
            FROM sale_items i
            INNER JOIN products p ON p.id = i.product_id
            WHERE i.sale_id = ?1
            ORDER BY i.created_at, i.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // Transactional variants (called by the engines inside a transaction)
    // =========================================================================

    /// Gets all items for a sale inside an open transaction.
    ///
    /// Cancellation reads the items on the transaction's own connection;
    /// reading through the pool mid-transaction would deadlock a
    /// single-connection pool.
    pub async fn get_items_tx(
        conn: &mut SqliteConnection,
        sale_id: &str,
    ) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price_cents,
                   discount_cents, line_total_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }

    /// Gets a sale by ID inside an open transaction, scoped to the tenant.
    pub async fn get_by_id_tx(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND id = ?2"
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(sale)
    }

    /// Computes the tenant's next sale sequence number.
    ///
    /// Must run inside the same transaction as the sale insert: SQLite's
    /// single-writer commit serializes concurrent settlements, and the
    /// UNIQUE (tenant_id, sequence) index turns any residual race into a
    /// retryable constraint failure instead of a duplicate number.
    pub async fn next_sequence(conn: &mut SqliteConnection, tenant_id: &str) -> DbResult<i64> {
        let next: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(sequence), 0) + 1 FROM sales WHERE tenant_id = ?1")
                .bind(tenant_id)
                .fetch_one(conn)
                .await?;

        Ok(next)
    }

    /// Inserts a sale row inside an open transaction.
    pub async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
        debug!(id = %sale.id, sequence = %sale.sequence, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, sequence, status,
                total_cents, discount_cents, payment_method, client_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(sale.sequence)
        .bind(sale.status)
        .bind(sale.total_cents)
        .bind(sale.discount_cents)
        .bind(sale.payment_method)
        .bind(&sale.client_id)
        .bind(sale.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts a sale item inside an open transaction.
    ///
    /// ## Snapshot Pattern
    /// The unit price is copied from the cart, frozen at settlement time.
    /// Later product price changes never rewrite history.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
        debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Inserting sale item");

        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity,
                unit_price_cents, discount_cents, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.discount_cents)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Flips a COMPLETED sale to CANCELLED inside an open transaction.
    ///
    /// The `status = 'completed'` guard makes the flip race-proof: if two
    /// cancellations race, exactly one sees a row change.
    ///
    /// ## Returns
    /// * `Ok(true)` - Sale was flipped
    /// * `Ok(false)` - Sale was not in COMPLETED state (or not found)
    pub async fn mark_cancelled(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        sale_id: &str,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET status = 'cancelled'
            WHERE tenant_id = ?1 AND id = ?2 AND status = 'completed'
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
