//! In-memory backend and log setup shared by the service tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stockdesk_core::{CatalogProduct, CoreError, CreditStatus, Money};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use crate::backend::Backend;
use crate::error::{ClientError, ClientResult, RejectionKind};
use crate::protocol::{
    CheckoutReceipt, CheckoutRequest, CreditHistoryRecord, CreditPaymentReceipt,
    CreditPaymentRequest, CreditSaleRecord, PaymentRecord,
};

/// Installs a test-scoped subscriber; honours `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Backend that keeps sales and payments in memory.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub products: Mutex<HashMap<String, CatalogProduct>>,
    pub sales: Mutex<HashMap<String, CreditHistoryRecord>>,
    pub checkouts: Mutex<Vec<CheckoutRequest>>,
    /// Total the backend reports instead of its own computation.
    pub total_override: Mutex<Option<Money>>,
    /// Credit the next checkout defers.
    pub credit_amount: Mutex<Money>,
    /// Extra amount paid "from another terminal" on each payment.
    pub concurrent_payment: Mutex<Money>,
    pub unavailable: AtomicBool,
    pub payment_calls: AtomicUsize,
    /// When set, payments wait here before answering.
    pub payment_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, id: &str, price: i64, stock: i64) -> Self {
        self.products.lock().unwrap().insert(
            id.to_string(),
            CatalogProduct {
                product_id: id.to_string(),
                product_name: format!("Product {id}"),
                sku: format!("SKU-{id}"),
                barcode: None,
                unit_price: Money::from_major(price),
                cost_price: Money::from_major(price / 2),
                available_quantity: stock,
            },
        );
        self
    }

    pub fn with_credit_sale(self, id: &str, credit: i64, created_at: DateTime<Utc>) -> Self {
        self.sales.lock().unwrap().insert(
            id.to_string(),
            CreditHistoryRecord {
                sale: CreditSaleRecord {
                    id: id.to_string(),
                    invoice_number: format!("INV-{id}"),
                    total: Money::from_major(credit),
                    credit_amount: Money::from_major(credit),
                    created_at,
                },
                payments: Vec::new(),
            },
        );
        self
    }

    fn check_available(&self) -> ClientResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("connection refused".into()));
        }
        Ok(())
    }

    fn balance(record: &CreditHistoryRecord) -> Money {
        let paid: Money = record.payments.iter().map(|p| p.amount).sum();
        (record.sale.credit_amount - paid).clamp_non_negative()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn lookup_product(&self, product_id: &str) -> ClientResult<CatalogProduct> {
        self.check_available()?;
        self.products
            .lock()
            .unwrap()
            .get(product_id)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    async fn submit_checkout(&self, request: &CheckoutRequest) -> ClientResult<CheckoutReceipt> {
        self.check_available()?;
        let mut checkouts = self.checkouts.lock().unwrap();
        checkouts.push(request.clone());

        let sale_id = format!("sale-{}", checkouts.len());
        let gross: Money = request
            .items
            .iter()
            .map(|i| i.unit_price * i.quantity)
            .sum();
        let total = self.total_override.lock().unwrap().unwrap_or(gross);
        let credit_amount = *self.credit_amount.lock().unwrap();

        self.sales.lock().unwrap().insert(
            sale_id.clone(),
            CreditHistoryRecord {
                sale: CreditSaleRecord {
                    id: sale_id.clone(),
                    invoice_number: format!("INV-{:04}", checkouts.len()),
                    total,
                    credit_amount,
                    created_at: Utc::now(),
                },
                payments: Vec::new(),
            },
        );

        Ok(CheckoutReceipt {
            sale_id,
            invoice_number: format!("INV-{:04}", checkouts.len()),
            total,
            credit_amount,
        })
    }

    async fn submit_credit_payment(
        &self,
        request: &CreditPaymentRequest,
    ) -> ClientResult<CreditPaymentReceipt> {
        self.payment_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.payment_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_available()?;

        let mut sales = self.sales.lock().unwrap();
        let record = sales
            .get_mut(&request.sale_id)
            .ok_or_else(|| ClientError::Rejected {
                kind: RejectionKind::NotFound,
                message: "Sale not found".into(),
            })?;

        let concurrent = *self.concurrent_payment.lock().unwrap();
        if concurrent.is_positive() {
            record.payments.push(PaymentRecord {
                id: format!("other-{}", record.payments.len()),
                amount: concurrent,
                method: request.method,
                received_by: Some("other-terminal".into()),
                notes: None,
                created_at: Utc::now(),
            });
        }

        let previous_balance = Self::balance(record);
        if previous_balance.is_zero() {
            return Err(ClientError::Rejected {
                kind: RejectionKind::AlreadySettled,
                message: "Sale is already fully paid".into(),
            });
        }
        if request.amount > previous_balance {
            return Err(ClientError::Rejected {
                kind: RejectionKind::Validation,
                message: format!("Amount exceeds outstanding balance of {previous_balance}"),
            });
        }

        let payment_id = format!("pay-{}", record.payments.len() + 1);
        record.payments.push(PaymentRecord {
            id: payment_id.clone(),
            amount: request.amount,
            method: request.method,
            received_by: request.received_by.clone(),
            notes: request.notes.clone(),
            created_at: Utc::now(),
        });

        let new_balance = Self::balance(record);
        let credit_status = CreditStatus::derive(
            record.sale.credit_amount,
            record.sale.credit_amount - new_balance,
        );

        Ok(CreditPaymentReceipt {
            payment_id,
            previous_balance,
            new_balance,
            credit_status,
            is_fully_paid: new_balance.is_zero(),
            message: Some("Payment recorded".into()),
        })
    }

    async fn fetch_credit_history(&self, sale_id: &str) -> ClientResult<CreditHistoryRecord> {
        self.check_available()?;
        self.sales
            .lock()
            .unwrap()
            .get(sale_id)
            .cloned()
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }
}
