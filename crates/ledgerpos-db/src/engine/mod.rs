//! # Engine Module
//!
//! The two atomic engines at the heart of LedgerPOS.
//!
//! ## Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Engine Control Flow                              │
//! │                                                                         │
//! │  Caller (POS UI)                                                        │
//! │       │ settle(tenant, cart)              cancel(tenant, sale_id)       │
//! │       ▼                                        ▼                        │
//! │  SettlementEngine                        CancellationEngine             │
//! │  ┌───────────────────────────┐           ┌───────────────────────────┐  │
//! │  │ ONE TRANSACTION           │           │ ONE TRANSACTION           │  │
//! │  │ 1. validate cart (pure)   │           │ 1. load sale              │  │
//! │  │ 2. resolve products       │           │ 2. reject if cancelled    │  │
//! │  │ 3. check availability     │           │ 3. guarded status flip    │  │
//! │  │ 4. assign sequence        │           │ 4. per item:              │  │
//! │  │ 5. insert sale + items    │           │    increment stock        │  │
//! │  │ 6. per item:              │           │    append IN movement     │  │
//! │  │    guarded decrement      │           │ 5. commit                 │  │
//! │  │    append OUT movement    │           └───────────────────────────┘  │
//! │  │ 7. commit                 │                                          │
//! │  └───────────────────────────┘                                          │
//! │                                                                         │
//! │  Any error before commit ⇒ the transaction rolls back: no sale row,    │
//! │  no items, no stock change, no ledger entries. All-or-nothing.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submodules
//!
//! - [`settlement`] - Atomic sale commit + manual stock adjustments
//! - [`cancellation`] - Atomic sale reversal
//! - [`receipt`] - Receipt view assembly for completed/cancelled sales

pub mod cancellation;
pub mod receipt;
pub mod settlement;
