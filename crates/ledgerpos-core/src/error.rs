//! # Error Types
//!
//! Domain-specific error types for ledgerpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ledgerpos-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed cart input                           │
//! │                                                                         │
//! │  ledgerpos-db errors (separate crate)                                  │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - CoreError or DbError, per engine call          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Caller/UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, shortfall, etc.)
//! 3. Errors are enum variants, never String
//! 4. No error here implies any state change: every variant is raised
//!    before or inside an atomic unit that rolls back on failure

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the settlement and cancellation
/// engines. All variants leave persistent state unchanged and are safe to
/// retry after the caller adjusts its input.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced product does not exist or belongs to another tenant.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds on-hand quantity at commit time.
    ///
    /// ## User Workflow
    /// ```text
    /// Settle cart (qty: 5)
    ///      │
    ///      ▼
    /// Guarded decrement sees available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 left" — caller re-fetches stock and retries
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Cancellation target missing or not owned by the tenant.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Cancellation target is already in the terminal CANCELLED state.
    ///
    /// A second cancellation request is rejected, not silently accepted.
    /// Callers that want soft-idempotent behavior may match on this
    /// variant and treat it as success.
    #[error("Sale {0} is already cancelled")]
    AlreadyCancelled(String),

    /// Referenced client does not exist or belongs to another tenant.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// The shortfall carried by an `InsufficientStock` error, if any.
    pub fn shortfall(&self) -> Option<i64> {
        match self {
            CoreError::InsufficientStock {
                available,
                requested,
                ..
            } => Some(requested - available),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structural cart validation errors.
///
/// Raised before any database work starts; recoverable by the caller
/// correcting its input.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Cart has no items.
    #[error("Cart must contain at least one item")]
    EmptyCart,

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity must be at least 1.
    #[error("Quantity for product {product_id} must be at least 1")]
    QuantityTooSmall { product_id: String },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A monetary field must not be negative.
    #[error("{field} must not be negative")]
    NegativeAmount { field: String },

    /// Line discount exceeds the line's gross amount.
    #[error("Discount for product {product_id} exceeds the line amount")]
    DiscountExceedsLine { product_id: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-42".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-42: available 3, requested 5"
        );
        assert_eq!(err.shortfall(), Some(2));
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::EmptyCart;
        assert_eq!(err.to_string(), "Cart must contain at least one item");

        let err = ValidationError::NegativeAmount {
            field: "discount".to_string(),
        };
        assert_eq!(err.to_string(), "discount must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::EmptyCart;
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
