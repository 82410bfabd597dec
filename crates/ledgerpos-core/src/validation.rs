//! # Validation Module
//!
//! Structural cart validation for LedgerPOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure, before any database work)                 │
//! │  ├── items non-empty, bounded                                          │
//! │  ├── quantities >= 1 and bounded                                       │
//! │  └── prices, discounts and total non-negative                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Settlement transaction (ledgerpos-db)                        │
//! │  ├── product existence, tenant scoping                                 │
//! │  ├── client membership                                                 │
//! │  └── stock availability (re-checked at write time)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0) on products                                 │
//! │  ├── UNIQUE (tenant_id, sequence) on sales                             │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::Cart;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates the structural shape of a cart.
///
/// ## Rules
/// - items non-empty, at most `MAX_CART_ITEMS`
/// - every quantity between 1 and `MAX_ITEM_QUANTITY`
/// - every unit price and line discount non-negative
/// - no line discount larger than the line's gross amount
/// - sale discount and caller-supplied total non-negative
///
/// ## What This Does NOT Check
/// Product existence, tenant ownership and stock availability are
/// deliberately left to the settlement transaction: checking them here
/// would race against concurrent settlements. The caller's total/discount
/// split is trusted once non-negative; it is not reconciled against the
/// computed line totals.
pub fn validate_cart(cart: &Cart) -> ValidationResult<()> {
    if cart.items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if cart.items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    for item in &cart.items {
        if item.quantity < 1 {
            return Err(ValidationError::QuantityTooSmall {
                product_id: item.product_id.clone(),
            });
        }

        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::QuantityTooLarge {
                requested: item.quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if item.unit_price_cents < 0 {
            return Err(ValidationError::NegativeAmount {
                field: "unit price".to_string(),
            });
        }

        if item.discount_cents < 0 {
            return Err(ValidationError::NegativeAmount {
                field: "item discount".to_string(),
            });
        }

        if item.line_total().is_negative() {
            return Err(ValidationError::DiscountExceedsLine {
                product_id: item.product_id.clone(),
            });
        }
    }

    if cart.discount_cents < 0 {
        return Err(ValidationError::NegativeAmount {
            field: "discount".to_string(),
        });
    }

    if cart.total_cents < 0 {
        return Err(ValidationError::NegativeAmount {
            field: "total".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
