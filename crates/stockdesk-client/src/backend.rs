//! # Backend Seam
//!
//! The four calls the client makes against the backend. [`HttpBackend`]
//! is the production implementation; services take any `Backend` so they
//! can be driven by an in-memory fake in tests.
//!
//! [`HttpBackend`]: crate::http::HttpBackend

use async_trait::async_trait;
use stockdesk_core::CatalogProduct;

use crate::error::ClientResult;
use crate::protocol::{
    CheckoutReceipt, CheckoutRequest, CreditHistoryRecord, CreditPaymentReceipt,
    CreditPaymentRequest,
};

/// Remote source of truth for the catalog, sales and credit balances.
///
/// ## Contract
/// - `Err` from a submission means nothing was recorded locally
/// - Values returned are authoritative over local derivations
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches the current price and stock snapshot for a product.
    async fn lookup_product(&self, product_id: &str) -> ClientResult<CatalogProduct>;

    /// Persists a sale and returns its id, invoice number and credit amount.
    async fn submit_checkout(&self, request: &CheckoutRequest) -> ClientResult<CheckoutReceipt>;

    /// Records a settlement and returns the authoritative new balance.
    async fn submit_credit_payment(
        &self,
        request: &CreditPaymentRequest,
    ) -> ClientResult<CreditPaymentReceipt>;

    /// Fetches a credit sale together with every payment made against it.
    async fn fetch_credit_history(&self, sale_id: &str) -> ClientResult<CreditHistoryRecord>;
}
