//! # Domain Types
//!
//! Core domain types used throughout LedgerPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Movement     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  tenant_id      │   │  sequence       │   │  kind (IN/OUT)  │       │
//! │  │  quantity ≥ 0   │   │  status         │   │  quantity > 0   │       │
//! │  │  price_cents    │   │  total_cents    │   │  sale_id?       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Tenant Scoping
//! Every owning entity carries a `tenant_id`. Repositories filter every
//! query by it; a tenant can never observe another tenant's rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A tenant-owned stock-keeping unit.
///
/// ## Quantity Discipline
/// `quantity` is mutated exclusively through the movement-ledger pairing:
/// every change travels with an appended [`Movement`] inside the same
/// database transaction. The invariant `quantity >= 0` is enforced by a
/// guarded decrement at write time, never by a stale pre-check alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    /// Display name shown on receipts and reports.
    pub name: String,

    /// Free-form category label.
    pub category: String,

    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Current on-hand quantity. Invariant: always >= 0.
    pub quantity: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock entering (manual entry, sale cancellation return).
    In,
    /// Stock leaving (manual exit, sale settlement).
    Out,
}

/// An immutable stock-ledger entry.
///
/// The ledger is append-only: nothing in this workspace updates or deletes
/// a movement once written. A product's current quantity is always
/// reconstructible as Σ(IN) − Σ(OUT) over its movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movement {
    pub id: String,
    pub tenant_id: String,
    /// Referenced product (back-reference for audit, not ownership).
    pub product_id: String,
    pub kind: MovementKind,
    /// Moved quantity. Invariant: always > 0; direction lives in `kind`.
    pub quantity: i64,
    /// The sale that caused this movement, when there is one.
    ///
    /// Settlement writes OUT movements tagged with the sale id; a
    /// cancellation writes IN movements (returns) tagged the same way, so
    /// audit reconstruction can group a sale's movements together.
    /// Manual adjustments leave this empty.
    pub sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
///
/// Both states are terminal for the sale's content: `Completed → Cancelled`
/// is the only transition, one-way, performed by the cancellation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been settled: stock decremented, ledger written.
    Completed,
    /// Sale was reversed: stock returned, return movements written.
    Cancelled,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Instant bank transfer (Pix).
    Pix,
    /// Regular bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Human-readable label for receipts.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Pix => "Pix",
            PaymentMethod::Transfer => "Transfer",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A settled (and possibly later cancelled) sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    /// Monotonically increasing per tenant, starting at 1. Never reused.
    pub sequence: i64,
    pub status: SaleStatus,
    pub total_cents: i64,
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    /// Optional client reference. Client lifecycle is managed elsewhere.
    pub client_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the whole-sale discount as Money.
    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern: the unit price is frozen at settlement time and
/// never re-read from the live product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    /// Owning sale. Items live and die with their sale (cascade).
    pub sale_id: String,
    pub product_id: String,
    /// Quantity sold. Invariant: always > 0.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discount applied to this line.
    pub discount_cents: i64,
    /// quantity × unit_price − discount.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Cart (settlement input)
// =============================================================================

/// One line of a cart submitted for settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents as quoted to the customer.
    pub unit_price_cents: i64,
    /// Discount applied to this line, in cents.
    pub discount_cents: i64,
}

impl CartItem {
    /// quantity × unit_price − discount for this line.
    pub fn line_total(&self) -> Money {
        crate::money::line_total(
            Money::from_cents(self.unit_price_cents),
            self.quantity,
            Money::from_cents(self.discount_cents),
        )
    }
}

/// A cart submitted to the settlement engine.
///
/// The caller supplies the grand total and the whole-sale discount; the
/// engine validates both for non-negativity but does not recompute the
/// split (see `validation` module notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub client_id: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_line_total() {
        let item = CartItem {
            product_id: "p1".to_string(),
            quantity: 3,
            unit_price_cents: 500,
            discount_cents: 100,
        };
        assert_eq!(item.line_total().cents(), 1400);
    }

    #[test]
    fn test_payment_method_labels() {
        assert_eq!(PaymentMethod::Cash.label(), "Cash");
        assert_eq!(PaymentMethod::Pix.label(), "Pix");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SaleStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }
}
