//! # Backend Wire Protocol
//!
//! JSON bodies exchanged with the Stockdesk REST backend.
//!
//! ## Message Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        REST Message Flow                                │
//! │                                                                         │
//! │   Client                                            Backend             │
//! │     │                                                  │                │
//! │     │  GET  products/{id}                              │                │
//! │     │ ────────────────────────────────────────────────►│                │
//! │     │ ◄──────────────────────────────── ProductRecord  │                │
//! │     │                                                  │                │
//! │     │  POST sales/checkout        CheckoutRequest      │                │
//! │     │ ────────────────────────────────────────────────►│                │
//! │     │ ◄────────────────────────────── CheckoutReceipt  │                │
//! │     │                                                  │                │
//! │     │  POST credit-sales/{id}/payments                 │                │
//! │     │                             CreditPaymentRequest │                │
//! │     │ ────────────────────────────────────────────────►│                │
//! │     │ ◄───────────────────────── CreditPaymentReceipt  │                │
//! │     │                                                  │                │
//! │     │  GET  credit-sales/{id}/payments                 │                │
//! │     │ ────────────────────────────────────────────────►│                │
//! │     │ ◄────────────────────────── CreditHistoryRecord  │                │
//! │     │                                                  │                │
//! │     │  any failure                        ErrorBody    │                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Encoding
//! - Field names are camelCase
//! - Money is a decimal number in major units (`1890.5`)
//! - Percentages are numbers from 0 to 100
//! - A discount is two fields, `discountPercent` and `discountAmount`, the
//!   unused one sent as 0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockdesk_core::validation::{validate_price, ValidationResult};
use stockdesk_core::{
    Cart, CatalogProduct, CreditLedger, CreditPayment, CreditSale, CreditStatus, CustomerInfo,
    Money, PaymentMethod, Percent,
};

// =============================================================================
// Field Encodings
// =============================================================================

/// Money as a JSON number in major units.
pub mod major_units {
    use serde::{Deserialize, Deserializer, Serializer};
    use stockdesk_core::Money;

    pub fn serialize<S: Serializer>(amount: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(amount.to_major_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major_f64(value).map_err(serde::de::Error::custom)
    }
}

/// Percent as a JSON number from 0 to 100.
pub mod percent_points {
    use serde::{Deserialize, Deserializer, Serializer};
    use stockdesk_core::Percent;

    pub fn serialize<S: Serializer>(rate: &Percent, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(rate.percentage())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Percent, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Percent::new(value).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog lookup response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_id: String,
    #[serde(alias = "name")]
    pub product_name: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(with = "major_units")]
    pub unit_price: Money,
    #[serde(with = "major_units", default)]
    pub cost_price: Money,
    #[serde(default)]
    pub available_quantity: i64,
}

impl ProductRecord {
    /// Converts to the domain type, rejecting negative prices.
    pub fn into_catalog(self) -> ValidationResult<CatalogProduct> {
        validate_price(self.unit_price)?;
        validate_price(self.cost_price)?;

        Ok(CatalogProduct {
            product_id: self.product_id,
            product_name: self.product_name,
            sku: self.sku,
            barcode: self.barcode,
            unit_price: self.unit_price,
            cost_price: self.cost_price,
            available_quantity: self.available_quantity,
        })
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// One cart line as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: String,
    pub quantity: i64,
    #[serde(with = "major_units")]
    pub unit_price: Money,
    #[serde(with = "percent_points")]
    pub discount_percent: Percent,
    #[serde(with = "major_units")]
    pub discount_amount: Money,
}

/// Checkout submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutLine>,
    pub customer: CustomerInfo,
    #[serde(with = "percent_points")]
    pub discount_percent: Percent,
    #[serde(with = "major_units")]
    pub discount_amount: Money,
    #[serde(with = "percent_points")]
    pub tax_percent: Percent,
    pub notes: String,
}

impl CheckoutRequest {
    /// Renders a cart into the submission body.
    ///
    /// Only the pricing inputs are sent; the backend recomputes the totals.
    pub fn from_cart(cart: &Cart) -> Self {
        CheckoutRequest {
            items: cart
                .items
                .iter()
                .map(|item| CheckoutLine {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    discount_percent: item.discount.percent_value(),
                    discount_amount: item.discount.amount_value(),
                })
                .collect(),
            customer: cart.customer.clone(),
            discount_percent: cart.discount.percent_value(),
            discount_amount: cart.discount.amount_value(),
            tax_percent: cart.tax,
            notes: cart.notes.clone(),
        }
    }
}

/// Checkout success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub sale_id: String,
    pub invoice_number: String,
    #[serde(with = "major_units")]
    pub total: Money,
    #[serde(with = "major_units", default)]
    pub credit_amount: Money,
}

impl CheckoutReceipt {
    /// Whether part of the total was deferred.
    pub fn has_credit(&self) -> bool {
        self.credit_amount.is_positive()
    }

    /// The credit read model for this receipt.
    pub fn to_credit_sale(&self, created_at: DateTime<Utc>) -> CreditSale {
        CreditSale::new(
            self.sale_id.clone(),
            self.invoice_number.clone(),
            self.total,
            self.credit_amount,
            created_at,
        )
    }
}

// =============================================================================
// Credit Payments
// =============================================================================

/// Credit payment submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPaymentRequest {
    pub sale_id: String,
    #[serde(with = "major_units")]
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub received_by: Option<String>,
}

/// Credit payment success response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPaymentReceipt {
    pub payment_id: String,
    #[serde(with = "major_units")]
    pub previous_balance: Money,
    #[serde(with = "major_units")]
    pub new_balance: Money,
    pub credit_status: CreditStatus,
    pub is_fully_paid: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// A sale as returned with its credit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditSaleRecord {
    pub id: String,
    pub invoice_number: String,
    #[serde(with = "major_units")]
    pub total: Money,
    #[serde(with = "major_units")]
    pub credit_amount: Money,
    pub created_at: DateTime<Utc>,
}

/// One payment in a credit history response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    #[serde(with = "major_units")]
    pub amount: Money,
    pub method: PaymentMethod,
    #[serde(default)]
    pub received_by: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Credit history response: the authoritative record for one sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditHistoryRecord {
    pub sale: CreditSaleRecord,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

impl CreditHistoryRecord {
    /// Rebuilds a ledger; balance and status are derived, not trusted.
    pub fn into_ledger(self) -> CreditLedger {
        let sale_id = self.sale.id.clone();
        let sale = CreditSale::new(
            self.sale.id,
            self.sale.invoice_number,
            self.sale.total,
            self.sale.credit_amount,
            self.sale.created_at,
        );

        let payments = self
            .payments
            .into_iter()
            .map(|p| CreditPayment {
                id: p.id,
                sale_id: sale_id.clone(),
                amount: p.amount,
                method: p.method,
                received_by: p.received_by,
                notes: p.notes,
                created_at: p.created_at,
            })
            .collect();

        CreditLedger::from_history(sale, payments)
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failure body. Backends differ on `message` vs `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}
