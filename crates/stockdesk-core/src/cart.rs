//! # Cart Pricing Engine
//!
//! The in-progress sale: line items plus order-level discount, tax,
//! customer and notes, and the arithmetic that turns them into a total.
//!
//! ## Pricing Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Pricing Pipeline                            │
//! │                                                                         │
//! │  per line:   gross = unit_price × quantity                              │
//! │              net   = gross − line discount (percent of gross | amount)  │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  subtotal  = Σ net                                                      │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  taxable   = subtotal − order discount (percent of subtotal | amount)   │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  tax       = taxable × tax percent                                      │
//! │  total     = taxable + tax                                              │
//! │                                                                         │
//! │  Every percent application rounds half up to the minor unit, once.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! Every mutation is infallible. Nonsensical input (negative price, zero
//! quantity, a discount larger than its line) yields a nonsensical total
//! rather than an error; checkout validates quantities before submission.
//! Percentages can't be out of range because [`Percent`] checks them at
//! construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CatalogProduct, CustomerInfo, CustomerInfoPatch, Discount, Percent};

// =============================================================================
// Line Item
// =============================================================================

/// One product's presence in an open cart.
///
/// ## Price Freezing
/// `unit_price` and `cost_price` are captured from the catalog when the
/// line is created. Later catalog changes don't reach an open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Unique within a cart
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub cost_price: Money,
    pub discount: Discount,
    /// Stock at lookup time; advisory only
    pub available_quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Snapshots a catalog product into a new, undiscounted line.
    pub fn from_catalog(product: &CatalogProduct, quantity: i64) -> Self {
        LineItem {
            product_id: product.product_id.clone(),
            product_name: product.product_name.clone(),
            sku: product.sku.clone(),
            barcode: product.barcode.clone(),
            quantity,
            unit_price: product.unit_price,
            cost_price: product.cost_price,
            discount: Discount::none(),
            available_quantity: product.available_quantity,
            added_at: Utc::now(),
        }
    }

    /// Unit price × quantity.
    pub fn gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// What the line discount takes off the gross.
    pub fn discount_amount(&self) -> Money {
        self.discount.resolve(self.gross())
    }

    /// Gross less the line discount.
    pub fn net(&self) -> Money {
        self.gross() - self.discount_amount()
    }

    /// Cost price × quantity.
    pub fn cost(&self) -> Money {
        self.cost_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product merges quantity)
/// - Items keep insertion order
/// - A line or order discount is either a percent or an amount, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<LineItem>,
    pub customer: CustomerInfo,
    /// Order-level discount, applied to the subtotal
    pub discount: Discount,
    /// Applied after the order discount
    pub tax: Percent,
    pub notes: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            customer: CustomerInfo::default(),
            discount: Discount::none(),
            tax: Percent::zero(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a line, or merges its quantity into the existing line for the
    /// same product.
    ///
    /// ## Behavior
    /// - Product already in cart: quantities add (saturating); the existing
    ///   line keeps its price snapshot and discount
    /// - Product not in cart: appended
    /// - No check against `available_quantity`
    pub fn add_item(&mut self, item: LineItem) {
        if let Some(existing) = self.find_mut(&item.product_id) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            return;
        }

        self.items.push(item);
    }

    /// Replaces a line's quantity. Not clamped; unknown products are ignored.
    pub fn update_item_quantity(&mut self, product_id: &str, quantity: i64) {
        if let Some(item) = self.find_mut(product_id) {
            item.quantity = quantity;
        }
    }

    /// Replaces a line's discount. Unknown products are ignored.
    ///
    /// Setting a percent discount drops any amount discount on the line and
    /// vice versa.
    pub fn update_item_discount(&mut self, product_id: &str, discount: Discount) {
        if let Some(item) = self.find_mut(product_id) {
            item.discount = discount;
        }
    }

    /// Removes a line. Removing an absent product is a no-op.
    pub fn remove_item(&mut self, product_id: &str) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Replaces the order-level discount.
    pub fn set_discount(&mut self, discount: Discount) {
        self.discount = discount;
    }

    /// Replaces the tax percentage.
    pub fn set_tax_percent(&mut self, tax: Percent) {
        self.tax = tax;
    }

    /// Merges the provided customer fields, leaving the rest untouched.
    pub fn set_customer_info(&mut self, patch: CustomerInfoPatch) {
        self.customer.merge(patch);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    /// Resets every field to its empty value.
    pub fn clear(&mut self) {
        *self = Cart::new();
    }

    /// Looks up a line by product.
    pub fn item(&self, product_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }

    /// Returns the number of unique items in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Σ line gross, before any discount.
    pub fn gross(&self) -> Money {
        self.items.iter().map(LineItem::gross).sum()
    }

    /// Σ line discounts.
    pub fn line_discounts(&self) -> Money {
        self.items.iter().map(LineItem::discount_amount).sum()
    }

    /// Σ (line gross − line discount).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(LineItem::net).sum()
    }

    /// What the order discount takes off the subtotal.
    pub fn order_discount(&self) -> Money {
        self.discount.resolve(self.subtotal())
    }

    /// Subtotal less the order discount.
    pub fn taxable_amount(&self) -> Money {
        self.subtotal() - self.order_discount()
    }

    /// Tax on the taxable amount.
    pub fn tax_amount(&self) -> Money {
        self.taxable_amount().percentage(self.tax)
    }

    /// The amount due.
    pub fn total(&self) -> Money {
        let taxable = self.taxable_amount();
        taxable + taxable.percentage(self.tax)
    }

    /// The full breakdown, computed in one pass over the lines.
    pub fn totals(&self) -> CartTotals {
        let gross = self.gross();
        let line_discounts = self.line_discounts();
        let subtotal = gross - line_discounts;
        let order_discount = self.discount.resolve(subtotal);
        let taxable_amount = subtotal - order_discount;
        let tax = taxable_amount.percentage(self.tax);

        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            gross,
            line_discounts,
            subtotal,
            order_discount,
            taxable_amount,
            tax,
            total: taxable_amount + tax,
        }
    }

    /// Lines asking for more than the catalog reported in stock.
    ///
    /// Advisory: the backend re-validates stock at checkout.
    pub fn stock_shortfalls(&self) -> Vec<StockShortfall> {
        self.items
            .iter()
            .filter(|i| i.quantity > i.available_quantity)
            .map(|i| StockShortfall {
                product_id: i.product_id.clone(),
                requested: i.quantity,
                available: i.available_quantity,
            })
            .collect()
    }

    /// Taxable amount less the cost of goods. Tax is not margin.
    pub fn estimated_margin(&self) -> Money {
        let cost: Money = self.items.iter().map(LineItem::cost).sum();
        self.taxable_amount() - cost
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Derived Views
// =============================================================================

/// Cart totals summary for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub gross: Money,
    pub line_discounts: Money,
    pub subtotal: Money,
    pub order_discount: Money,
    pub taxable_amount: Money,
    pub tax: Money,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        cart.totals()
    }
}

/// A line whose quantity exceeds the stock seen at lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: String,
    pub requested: i64,
    pub available: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
