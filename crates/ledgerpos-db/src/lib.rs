//! # ledgerpos-db: Database Layer & Engines for LedgerPOS
//!
//! This crate provides database access and the atomic engines for the
//! sale settlement and inventory ledger core. It uses SQLite for storage
//! with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LedgerPOS Data Flow                              │
//! │                                                                         │
//! │  Caller (POS UI / reports)                                             │
//! │       │ settle / cancel / read                                          │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   ledgerpos-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Engines    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (engine/*.rs) │───►│ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Settlement    │    │ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Cancellation  │    │ SaleRepo      │    │ ...          │  │   │
//! │  │   │ Receipt       │    │ MovementRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  │                        ┌───────▼───────┐                       │   │
//! │  │                        │   Database    │  SqlitePool (WAL)     │   │
//! │  │                        │   (pool.rs)   │                       │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Repository implementations (product, sale, ...)
//! - [`engine`] - Settlement, cancellation and receipt assembly
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledgerpos_db::{Database, DbConfig, SettlementEngine};
//! use ledgerpos_core::{Cart, CartItem, PaymentMethod};
//!
//! let db = Database::new(DbConfig::new("path/to/ledgerpos.db")).await?;
//! let engine = SettlementEngine::new(db.clone());
//!
//! let sale = engine.settle(tenant_id, &cart).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, EngineError, EngineResult};
pub use pool::{Database, DbConfig};

// Engine re-exports for convenience
pub use engine::cancellation::CancellationEngine;
pub use engine::receipt::{build_receipt, Receipt, ReceiptLine};
pub use engine::settlement::SettlementEngine;

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::movement::{MovementRepository, MovementWithProduct};
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleItemWithProduct, SaleRepository};
