//! # stockdesk-core: Pricing & Settlement Logic for Stockdesk
//!
//! This crate is the **heart** of Stockdesk. It prices a cart and tracks
//! what is still owed on credit sales, as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockdesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard (TypeScript)                       │   │
//! │  │    Product Search ──► Cart ──► Checkout ──► Credit Settlement   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ts-rs bindings                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockdesk-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │   │
//! │  │   │   money   │  │   cart    │  │  credit   │  │ validation│   │   │
//! │  │   │   Money   │  │   Cart    │  │  Ledger   │  │   rules   │   │   │
//! │  │   │  Percent  │  │ LineItem  │  │  Outcome  │  │  checks   │   │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO GLOBAL STATE • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 stockdesk-client (Backend Seam)                 │   │
//! │  │        catalog lookup, checkout, credit payments over HTTP      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Percent, Discount, CreditSale, CreditPayment, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart pricing engine
//! - [`credit`] - Credit settlement ledger
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network and file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are minor units (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use stockdesk_core::cart::Cart;
//! use stockdesk_core::money::Money;
//! use stockdesk_core::types::{CatalogProduct, Discount, Percent};
//! use stockdesk_core::cart::LineItem;
//!
//! let product = CatalogProduct {
//!     product_id: "p-1".to_string(),
//!     product_name: "Rice 5kg".to_string(),
//!     sku: "RICE-5".to_string(),
//!     barcode: None,
//!     unit_price: Money::from_major(1000),
//!     cost_price: Money::from_major(800),
//!     available_quantity: 40,
//! };
//!
//! let mut cart = Cart::new();
//! cart.add_item(LineItem::from_catalog(&product, 2));
//! cart.update_item_discount("p-1", Discount::Percent(Percent::from_bps(1000)));
//! cart.set_tax_percent(Percent::from_bps(500));
//!
//! assert_eq!(cart.subtotal(), Money::from_major(1800));
//! assert_eq!(cart.total(), Money::from_major(1890));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod credit;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockdesk_core::Money` instead of
// `use stockdesk_core::money::Money`

pub use cart::{Cart, CartTotals, LineItem, StockShortfall};
pub use credit::{CreditLedger, PaymentHistory, Reconciliation, SettlementOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line accepted at checkout
///
/// ## Business Reason
/// Catches a mistyped quantity (10000 instead of 10) before it becomes
/// an invoice.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Maximum length of sale and payment notes
pub const MAX_NOTES_LENGTH: usize = 500;

/// 100% in basis points
pub const MAX_PERCENT_BPS: u32 = 10_000;
