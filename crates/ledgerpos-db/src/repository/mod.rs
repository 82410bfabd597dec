//! # Repository Module
//!
//! Database repository implementations for LedgerPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine / caller                                                        │
//! │       │                                                                 │
//! │       │  db.products().get_by_id(tenant, id)                           │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── get_by_id(&self, tenant_id, id)                                   │
//! │  ├── insert(&self, product)                                            │
//! │  └── try_decrement_stock(conn, ...)   ← transactional variant          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Tenant scoping is applied uniformly                                 │
//! │  • Engines compose transactional variants inside one transaction       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactional Variants
//! Methods taking `&mut SqliteConnection` are meant to run inside an
//! engine-owned transaction; methods taking `&self` run standalone on
//! the pool. The engines only ever mutate stock through the
//! transactional variants, paired with a ledger append.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product reads and guarded stock writes
//! - [`movement::MovementRepository`] - Append-only stock ledger
//! - [`sale::SaleRepository`] - Sale and sale item operations
//! - [`client::ClientRepository`] - Client existence checks

pub mod client;
pub mod movement;
pub mod product;
pub mod sale;
