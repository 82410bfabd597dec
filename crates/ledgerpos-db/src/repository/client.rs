//! # Client Repository
//!
//! Minimal client surface for the settlement core.
//!
//! Client management (CRUD, refusing deletion while sales reference the
//! client) is a collaborator outside this core. The engines only need two
//! things from clients: a tenant-membership check when a cart names one,
//! and the display name for receipts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// A tenant-owned client record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for client lookups.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client. Exists so tests and seeds can create the rows
    /// the membership check and receipts read.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            "INSERT INTO clients (id, tenant_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&client.id)
        .bind(&client.tenant_id)
        .bind(&client.name)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Returns the client's display name, if the tenant owns such a client.
    pub async fn name_of(&self, tenant_id: &str, id: &str) -> DbResult<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM clients WHERE tenant_id = ?1 AND id = ?2")
                .bind(tenant_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(name)
    }

    /// Tenant-membership check inside an open transaction.
    pub async fn exists_tx(
        conn: &mut SqliteConnection,
        tenant_id: &str,
        id: &str,
    ) -> DbResult<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM clients WHERE tenant_id = ?1 AND id = ?2)")
                .bind(tenant_id)
                .bind(id)
                .fetch_one(conn)
                .await?;

        Ok(exists == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::client;

    #[tokio::test]
    async fn test_membership_is_tenant_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let c = client("t1", "Maria Souza");
        db.clients().insert(&c).await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        assert!(ClientRepository::exists_tx(tx.as_mut(), "t1", &c.id)
            .await
            .unwrap());
        assert!(!ClientRepository::exists_tx(tx.as_mut(), "t2", &c.id)
            .await
            .unwrap());
        tx.commit().await.unwrap();

        assert_eq!(
            db.clients().name_of("t1", &c.id).await.unwrap().as_deref(),
            Some("Maria Souza")
        );
    }
}
