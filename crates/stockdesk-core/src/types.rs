//! # Domain Types
//!
//! Core domain types shared by the pricing engine and the settlement ledger.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ CatalogProduct  │   │   CreditSale    │   │  CreditPayment  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  id             │   │  id             │       │
//! │  │  unit_price     │   │  invoice_number │   │  sale_id        │       │
//! │  │  cost_price     │   │  credit_amount  │   │  amount         │       │
//! │  │  available_qty  │   │  credit_balance │   │  method         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Percent      │   │    Discount     │   │  CreditStatus   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Percent(..)    │   │  None           │       │
//! │  │  1000 = 10%     │   │  Amount(..)     │   │  Pending        │       │
//! │  └─────────────────┘   └─────────────────┘   │  Partial / Paid │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_discount_amount, validate_percent_bps, ValidationResult};

// =============================================================================
// Percent
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%, 10000 bps = 100%
///
/// Used for tax and for percent discounts, at line and order level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// 100%.
    pub const FULL: Percent = Percent(10_000);

    /// Creates a percentage from basis points without range checks.
    ///
    /// For constants and trusted values. User input goes through
    /// [`Percent::new`] or [`Percent::try_from_bps`].
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a percentage from basis points, rejecting anything above 100%.
    pub fn try_from_bps(bps: u32) -> ValidationResult<Self> {
        validate_percent_bps(bps)?;
        Ok(Percent(bps))
    }

    /// Creates a percentage from a number in the 0–100 range.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::types::Percent;
    ///
    /// assert_eq!(Percent::new(8.25).unwrap().bps(), 825);
    /// assert!(Percent::new(100.5).is_err());
    /// assert!(Percent::new(-1.0).is_err());
    /// assert!(Percent::new(f64::NAN).is_err());
    /// ```
    pub fn new(pct: f64) -> ValidationResult<Self> {
        if !pct.is_finite() {
            return Err(ValidationError::InvalidFormat {
                field: "percent".to_string(),
                reason: "must be a finite number".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&pct) {
            return Err(ValidationError::OutOfRange {
                field: "percent".to_string(),
                min: 0,
                max: 100,
            });
        }

        Percent::try_from_bps((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display and the wire only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero percent.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount, either a percentage of its base or a fixed amount.
///
/// ## Why a Tagged Union?
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Two nullable fields                  One enum                          │
/// │  ───────────────────                  ────────                          │
/// │  discount_percent: 10                 Discount::Percent(10%)            │
/// │  discount_amount:  500   ← stale?     (no second field to go stale)     │
/// │                                                                         │
/// │  "Setting one clears the other" becomes a plain assignment.             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// "No discount" is `Amount(0)`, which is also the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Discount {
    /// Percentage of the base amount.
    Percent(Percent),
    /// Fixed amount off the base.
    Amount(Money),
}

impl Discount {
    /// No discount.
    #[inline]
    pub const fn none() -> Self {
        Discount::Amount(Money::zero())
    }

    /// Builds a discount from a form value and its "is percent" toggle.
    ///
    /// ## Rules
    /// - Percent: 0–100
    /// - Amount: non-negative
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    /// use stockdesk_core::types::{Discount, Percent};
    ///
    /// assert_eq!(
    ///     Discount::from_input(10.0, true).unwrap(),
    ///     Discount::Percent(Percent::from_bps(1000))
    /// );
    /// assert_eq!(
    ///     Discount::from_input(500.0, false).unwrap(),
    ///     Discount::Amount(Money::from_major(500))
    /// );
    /// assert!(Discount::from_input(-1.0, false).is_err());
    /// ```
    pub fn from_input(value: f64, is_percent: bool) -> ValidationResult<Self> {
        if is_percent {
            return Ok(Discount::Percent(Percent::new(value)?));
        }

        let amount = Money::from_major_f64(value)?;
        validate_discount_amount(amount)?;
        Ok(Discount::Amount(amount))
    }

    /// Rebuilds a discount from the two legacy wire fields.
    ///
    /// The percent wins whenever it is non-zero, even if an amount is
    /// also present.
    pub fn from_fields(percent: Percent, amount: Money) -> Self {
        if !percent.is_zero() {
            Discount::Percent(percent)
        } else {
            Discount::Amount(amount)
        }
    }

    /// Returns the amount taken off `base`.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    /// use stockdesk_core::types::{Discount, Percent};
    ///
    /// let gross = Money::from_major(2000);
    /// let off = Discount::Percent(Percent::from_bps(1000)).resolve(gross);
    /// assert_eq!(off, Money::from_major(200));
    ///
    /// let off = Discount::Amount(Money::from_major(150)).resolve(gross);
    /// assert_eq!(off, Money::from_major(150));
    /// ```
    pub fn resolve(&self, base: Money) -> Money {
        match self {
            Discount::Percent(rate) => base.percentage(*rate),
            Discount::Amount(amount) => *amount,
        }
    }

    /// The percent component for the wire (`discountPercent`), zero for amounts.
    pub fn percent_value(&self) -> Percent {
        match self {
            Discount::Percent(rate) => *rate,
            Discount::Amount(_) => Percent::zero(),
        }
    }

    /// The amount component for the wire (`discountAmount`), zero for percents.
    pub fn amount_value(&self) -> Money {
        match self {
            Discount::Percent(_) => Money::zero(),
            Discount::Amount(amount) => *amount,
        }
    }

    /// Checks whether this discount takes nothing off.
    pub fn is_none(&self) -> bool {
        match self {
            Discount::Percent(rate) => rate.is_zero(),
            Discount::Amount(amount) => amount.is_zero(),
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Discount::none()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a credit settlement was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// UPI transfer.
    Upi,
    /// Card on an external terminal.
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "CASH"),
            PaymentMethod::Upi => write!(f, "UPI"),
            PaymentMethod::Card => write!(f, "CARD"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "UPI" => Ok(PaymentMethod::Upi),
            "CARD" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["CASH".to_string(), "UPI".to_string(), "CARD".to_string()],
            }),
        }
    }
}

// =============================================================================
// Credit Status
// =============================================================================

/// Settlement state of a sale's deferred amount.
///
/// ## State Machine
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │   credit_amount == 0 ──► NONE   (never enters the ledger)               │
/// │                                                                         │
/// │   PENDING ──payment──► PARTIAL ──payment──► PAID (terminal)             │
/// │      │                                        ▲                         │
/// │      └──────────── payment of full balance ───┘                         │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreditStatus {
    /// No credit was extended.
    #[default]
    None,
    /// Credit extended, nothing paid yet.
    Pending,
    /// Some but not all of the credit is paid.
    Partial,
    /// Balance is zero. Terminal.
    Paid,
}

impl CreditStatus {
    /// Derives the status from the fixed credit amount and the sum paid.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_core::money::Money;
    /// use stockdesk_core::types::CreditStatus;
    ///
    /// let credit = Money::from_major(5000);
    /// assert_eq!(CreditStatus::derive(Money::zero(), Money::zero()), CreditStatus::None);
    /// assert_eq!(CreditStatus::derive(credit, Money::zero()), CreditStatus::Pending);
    /// assert_eq!(CreditStatus::derive(credit, Money::from_major(2000)), CreditStatus::Partial);
    /// assert_eq!(CreditStatus::derive(credit, credit), CreditStatus::Paid);
    /// ```
    pub fn derive(credit_amount: Money, total_paid: Money) -> Self {
        let balance = (credit_amount - total_paid).clamp_non_negative();

        if credit_amount.is_zero() {
            CreditStatus::None
        } else if total_paid.is_zero() {
            CreditStatus::Pending
        } else if balance.is_zero() {
            CreditStatus::Paid
        } else {
            CreditStatus::Partial
        }
    }

    /// Whether further payments are impossible.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, CreditStatus::Paid)
    }

    /// Whether the sale carries an outstanding amount.
    #[inline]
    pub fn is_outstanding(&self) -> bool {
        matches!(self, CreditStatus::Pending | CreditStatus::Partial)
    }
}

impl fmt::Display for CreditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditStatus::None => write!(f, "NONE"),
            CreditStatus::Pending => write!(f, "PENDING"),
            CreditStatus::Partial => write!(f, "PARTIAL"),
            CreditStatus::Paid => write!(f, "PAID"),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Free-text customer details attached to a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A partial customer update; `None` fields leave the current value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfoPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerInfo {
    /// Applies a partial update.
    pub fn merge(&mut self, patch: CustomerInfoPatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(email) = patch.email {
            self.email = Some(email);
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = patch.address {
            self.address = Some(address);
        }
    }

    /// Checks whether no detail has been entered.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

// =============================================================================
// Catalog Product
// =============================================================================

/// A catalog lookup result: the price and stock snapshot a line item is
/// built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub unit_price: Money,
    /// For margin reporting only.
    pub cost_price: Money,
    /// Advisory stock ceiling at lookup time.
    pub available_quantity: i64,
}

// =============================================================================
// Credit Sale
// =============================================================================

/// A persisted sale with a deferred amount.
///
/// `total` and `credit_amount` never change after persistence.
/// `credit_balance` and `credit_status` are derived by
/// [`CreditLedger`](crate::credit::CreditLedger) from the payment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditSale {
    pub id: String,
    pub invoice_number: String,
    pub total: Money,
    pub credit_amount: Money,
    pub credit_balance: Money,
    pub credit_status: CreditStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CreditSale {
    /// Creates the read model for a freshly persisted sale, nothing paid yet.
    pub fn new(
        id: impl Into<String>,
        invoice_number: impl Into<String>,
        total: Money,
        credit_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        CreditSale {
            id: id.into(),
            invoice_number: invoice_number.into(),
            total,
            credit_amount,
            credit_balance: credit_amount.clamp_non_negative(),
            credit_status: CreditStatus::derive(credit_amount, Money::zero()),
            created_at,
        }
    }

    /// Whole days since the sale was created, never negative.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use stockdesk_core::money::Money;
    /// use stockdesk_core::types::CreditSale;
    ///
    /// let created = Utc::now() - Duration::days(3);
    /// let sale = CreditSale::new("s-1", "INV-1", Money::from_major(10), Money::from_major(10), created);
    /// assert_eq!(sale.days_pending(Utc::now()), 3);
    /// ```
    pub fn days_pending(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }

    /// Amount collected at the till when the sale was made.
    pub fn paid_at_sale(&self) -> Money {
        self.total - self.credit_amount
    }
}

// =============================================================================
// Credit Payment
// =============================================================================

/// A settlement received against a credit sale.
///
/// Append-only: the ledger never offers an update or delete. Corrections
/// are new offsetting records made by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditPayment {
    pub id: String,
    pub sale_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub received_by: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
