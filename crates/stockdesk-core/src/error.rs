//! # Error Types
//!
//! Domain-specific error types for stockdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Pricing and settlement rule violations          │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  stockdesk-client errors (separate crate)                               │
//! │  └── ClientError      - Backend, config and reconciliation failures     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Caller               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Messages quote the ids and amounts involved, so the dashboard can show
//!   them as-is ("Amount exceeds outstanding balance of 3000.00")
//! - Amounts travel as [`Money`], never pre-formatted strings
//! - Returning an error means nothing was mutated

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent pricing or settlement rule violations. None of
/// them leave partial state behind: the value that raised the error is
/// unchanged.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale is not tracked by the ledger.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A settlement amount of zero or less.
    #[error("Amount must be positive")]
    PaymentNotPositive { requested: Money },

    /// A settlement larger than what is still owed.
    ///
    /// ## User Workflow
    /// ```text
    /// Outstanding balance: 3000.00
    ///      │
    ///      ▼
    /// Cashier enters 3001.00
    ///      │
    ///      ▼
    /// PaymentExceedsBalance { requested: 3001.00, max_allowed: 3000.00 }
    ///      │
    ///      ▼
    /// UI shows: "Amount exceeds outstanding balance of 3000.00"
    /// ```
    #[error("Amount exceeds outstanding balance of {max_allowed}")]
    PaymentExceedsBalance { requested: Money, max_allowed: Money },

    /// The sale's balance is already zero.
    #[error("Sale {sale_id} is already fully paid")]
    SaleAlreadySettled { sale_id: String },

    /// The sale was fully paid at the till; there is nothing to settle.
    #[error("Sale {sale_id} has no credit to settle")]
    NoCreditExtended { sale_id: String },

    /// A payment record addressed to a different sale.
    #[error("Payment for sale {payment_sale_id} cannot be recorded against sale {sale_id}")]
    PaymentSaleMismatch {
        sale_id: String,
        payment_sale_id: String,
    },

    /// Checkout was requested with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line with a quantity checkout cannot accept.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: String, quantity: i64 },

    /// A field failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether the error came from input the caller can correct and retry.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::PaymentNotPositive { .. }
                | CoreError::PaymentExceedsBalance { .. }
                | CoreError::EmptyCart
                | CoreError::InvalidQuantity { .. }
                | CoreError::Validation(_)
        )
    }

    /// The exact allowed maximum, for errors that carry one.
    pub fn max_allowed(&self) -> Option<Money> {
        match self {
            CoreError::PaymentExceedsBalance { max_allowed, .. } => Some(*max_allowed),
            _ => None,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input errors.
///
/// Raised by the validators in [`crate::validation`] and by the typed
/// constructors (`Percent::new`, `Money::parse`) before a value reaches a
/// cart or a ledger. The `field` string is what the form shows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Empty or whitespace-only input.
    #[error("{field} is required")]
    Required { field: String },

    /// Longer than the field allows, counted in characters.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Quantity or percent outside its accepted range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Zero or negative where only a positive number makes sense.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparseable amount, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Not one of the accepted values, e.g. an unknown payment method.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Result alias used throughout the core crate.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::PaymentExceedsBalance {
            requested: Money::from_major(3001),
            max_allowed: Money::from_major(3000),
        };
        assert_eq!(
            err.to_string(),
            "Amount exceeds outstanding balance of 3000.00"
        );
        assert_eq!(err.max_allowed(), Some(Money::from_major(3000)));

        let err = CoreError::PaymentNotPositive {
            requested: Money::zero(),
        };
        assert_eq!(err.to_string(), "Amount must be positive");
        assert_eq!(err.max_allowed(), None);
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sale id".to_string(),
        };
        assert_eq!(err.to_string(), "sale id is required");

        let err = ValidationError::TooLong {
            field: "notes".to_string(),
            max: 500,
        };
        assert_eq!(err.to_string(), "notes must be at most 500 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sale id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(core_err.is_input_error());
    }

    #[test]
    fn test_settlement_state_errors_are_not_input_errors() {
        let err = CoreError::SaleAlreadySettled {
            sale_id: "sale-1".to_string(),
        };
        assert!(!err.is_input_error());
        assert_eq!(err.to_string(), "Sale sale-1 is already fully paid");
    }
}
