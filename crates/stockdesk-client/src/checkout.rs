//! # Checkout Service
//!
//! Fills a cart from the catalog and submits it.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Flow                                   │
//! │                                                                         │
//! │  Cart ──► local checks (non-empty, quantities, notes, email)            │
//! │              │                                                          │
//! │              ├── fail ──► CoreError, nothing sent, cart untouched       │
//! │              ▼                                                          │
//! │  CheckoutRequest ──► Backend::submit_checkout                           │
//! │              │                                                          │
//! │              ├── fail ──► ClientError, cart untouched                   │
//! │              ▼                                                          │
//! │  CheckoutReceipt (backend total wins over the local draft)              │
//! │              │                                                          │
//! │              ├── credit_amount > 0 ──► CreditLedger opened              │
//! │              ▼                                                          │
//! │  cart.clear()                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::sync::Arc;
use stockdesk_core::validation::{validate_email, validate_id, validate_notes, validate_quantity};
use stockdesk_core::{Cart, CatalogProduct, CoreError, CoreResult, CreditLedger, LineItem};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::ClientResult;
use crate::protocol::{CheckoutReceipt, CheckoutRequest};

/// What a successful checkout produced.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub receipt: CheckoutReceipt,
    /// Present when part of the total was deferred.
    pub ledger: Option<CreditLedger>,
}

/// Catalog lookups and checkout submission for one terminal.
#[derive(Clone)]
pub struct CheckoutService {
    backend: Arc<dyn Backend>,
}

impl CheckoutService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        CheckoutService { backend }
    }

    /// Looks up a product and adds it to the cart at today's price.
    ///
    /// Returns the catalog snapshot the line was built from. The cart is
    /// only touched once the lookup succeeds.
    pub async fn add_product(
        &self,
        cart: &mut Cart,
        product_id: &str,
        quantity: i64,
    ) -> ClientResult<CatalogProduct> {
        validate_id("product id", product_id).map_err(CoreError::from)?;

        let product = self.backend.lookup_product(product_id).await?;
        cart.add_item(LineItem::from_catalog(&product, quantity));

        if let Some(line) = cart.item(product_id) {
            if line.quantity > product.available_quantity {
                debug!(
                    product_id,
                    requested = line.quantity,
                    available = product.available_quantity,
                    "Cart quantity exceeds stock at lookup"
                );
            }
        }

        Ok(product)
    }

    /// Submits the cart and clears it on success.
    pub async fn checkout(&self, cart: &mut Cart) -> ClientResult<CheckoutOutcome> {
        Self::validate_cart(cart)?;

        let draft_total = cart.total();
        let request = CheckoutRequest::from_cart(cart);
        debug!(items = request.items.len(), total = %draft_total, "Checking out");

        let receipt = match self.backend.submit_checkout(&request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(error = %e, "Checkout failed, cart kept");
                return Err(e);
            }
        };

        if receipt.total != draft_total {
            warn!(
                sale_id = %receipt.sale_id,
                local = %draft_total,
                backend = %receipt.total,
                "Backend total differs from local draft"
            );
        }

        let ledger = receipt
            .has_credit()
            .then(|| CreditLedger::open(receipt.to_credit_sale(Utc::now())));

        info!(
            sale_id = %receipt.sale_id,
            invoice = %receipt.invoice_number,
            total = %receipt.total,
            credit = %receipt.credit_amount,
            "Checkout accepted"
        );

        cart.clear();
        Ok(CheckoutOutcome { receipt, ledger })
    }

    /// Checks run before anything is sent.
    fn validate_cart(cart: &Cart) -> CoreResult<()> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        for item in &cart.items {
            if validate_quantity(item.quantity).is_err() {
                return Err(CoreError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
        }

        validate_notes(&cart.notes)?;
        if let Some(email) = cart.customer.email.as_deref() {
            validate_email(email)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::test_support::{init_tracing, FakeBackend};
    use std::sync::atomic::Ordering;
    use stockdesk_core::{CreditStatus, CustomerInfoPatch, Discount, Money, Percent};

    fn service(backend: FakeBackend) -> (CheckoutService, Arc<FakeBackend>) {
        init_tracing();
        let backend = Arc::new(backend);
        (CheckoutService::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_add_product_snapshots_price() {
        let (service, backend) = service(FakeBackend::new().with_product("A", 1000, 5));
        let mut cart = Cart::new();

        service.add_product(&mut cart, "A", 2).await.unwrap();

        // A later catalog change doesn't reach the open cart.
        backend
            .products
            .lock()
            .unwrap()
            .get_mut("A")
            .unwrap()
            .unit_price = Money::from_major(1200);
        service.add_product(&mut cart, "A", 1).await.unwrap();

        let line = cart.item("A").unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Money::from_major(1000));
    }

    #[tokio::test]
    async fn test_add_unknown_product_leaves_cart_alone() {
        let (service, _) = service(FakeBackend::new());
        let mut cart = Cart::new();

        let err = service.add_product(&mut cart, "nope", 1).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::ProductNotFound(_))));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_add_product_over_stock_is_allowed() {
        let (service, _) = service(FakeBackend::new().with_product("A", 10, 1));
        let mut cart = Cart::new();

        service.add_product(&mut cart, "A", 4).await.unwrap();
        assert_eq!(cart.stock_shortfalls().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_submits_and_clears() {
        let (service, backend) = service(FakeBackend::new().with_product("A", 1000, 5));
        let mut cart = Cart::new();
        service.add_product(&mut cart, "A", 2).await.unwrap();
        cart.update_item_discount("A", Discount::Percent(Percent::from_bps(1000)));
        cart.set_tax_percent(Percent::from_bps(500));
        *backend.total_override.lock().unwrap() = Some(Money::from_major(1890));

        let outcome = service.checkout(&mut cart).await.unwrap();

        assert_eq!(outcome.receipt.total, Money::from_major(1890));
        assert!(outcome.ledger.is_none());
        assert!(cart.is_empty());

        let sent = backend.checkouts.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].items[0].discount_percent, Percent::from_bps(1000));
        assert_eq!(sent[0].tax_percent, Percent::from_bps(500));
    }

    #[tokio::test]
    async fn test_checkout_with_credit_opens_ledger() {
        let (service, backend) = service(FakeBackend::new().with_product("A", 8000, 5));
        *backend.credit_amount.lock().unwrap() = Money::from_major(5000);
        let mut cart = Cart::new();
        service.add_product(&mut cart, "A", 1).await.unwrap();

        let outcome = service.checkout(&mut cart).await.unwrap();

        let ledger = outcome.ledger.unwrap();
        assert_eq!(ledger.sale_id(), outcome.receipt.sale_id);
        assert_eq!(ledger.credit_balance(), Money::from_major(5000));
        assert_eq!(ledger.status(), CreditStatus::Pending);
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_backend() {
        let (service, backend) = service(FakeBackend::new());
        let mut cart = Cart::new();

        let err = service.checkout(&mut cart).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::EmptyCart)));
        assert!(backend.checkouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected_before_submit() {
        let (service, backend) = service(FakeBackend::new().with_product("A", 10, 5));
        let mut cart = Cart::new();
        service.add_product(&mut cart, "A", 1).await.unwrap();
        cart.update_item_quantity("A", 0);

        let err = service.checkout(&mut cart).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(CoreError::InvalidQuantity { quantity: 0, .. })
        ));
        assert!(err.is_validation());
        assert!(backend.checkouts.lock().unwrap().is_empty());
        assert_eq!(cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_bad_email_rejected_before_submit() {
        let (service, backend) = service(FakeBackend::new().with_product("A", 10, 5));
        let mut cart = Cart::new();
        service.add_product(&mut cart, "A", 1).await.unwrap();
        cart.set_customer_info(CustomerInfoPatch {
            email: Some("not-an-email".to_string()),
            ..CustomerInfoPatch::default()
        });

        assert!(service.checkout(&mut cart).await.is_err());
        assert!(backend.checkouts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_backend_keeps_cart() {
        let (service, backend) = service(FakeBackend::new().with_product("A", 10, 5));
        let mut cart = Cart::new();
        service.add_product(&mut cart, "A", 2).await.unwrap();
        backend.unavailable.store(true, Ordering::SeqCst);

        let err = service.checkout(&mut cart).await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable(_)));
        assert_eq!(cart.total_quantity(), 2);
    }
}
