//! # Settlement Service
//!
//! Records payments against credit sales, keeping a local ledger per sale
//! in step with the backend.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Credit Payment Flow                                │
//! │                                                                         │
//! │  record_payment(sale, amount)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ledger.validate_payment ──fail──► CoreError (nothing sent)             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  in-flight guard ──busy──► PaymentInFlight (nothing sent)               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Backend::submit_credit_payment ──fail──► ClientError (ledger as-is)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ledger.record_payment, then reconcile against receipt.new_balance      │
//! │       │                                                                 │
//! │       ├── diverged ──► ReconciliationConflict (call refresh)            │
//! │       ▼                                                                 │
//! │  SettlementOutcome                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! The ledger map and the in-flight set sit behind `std::sync::Mutex`.
//! Neither lock is held across an `.await`.

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use stockdesk_core::validation::{validate_id, validate_notes};
use stockdesk_core::{
    CoreError, CreditLedger, CreditPayment, Money, PaymentHistory, PaymentMethod, Reconciliation,
    SettlementOutcome,
};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{ClientError, ClientResult};
use crate::protocol::CreditPaymentRequest;

/// Marks a sale as having a payment or refresh outstanding.
///
/// Removed from the set on drop, whichever way the call ends.
struct InFlightGuard<'a> {
    sale_id: String,
    in_flight: &'a Mutex<HashSet<String>>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.sale_id);
    }
}

/// Credit ledgers for the sales this terminal is settling.
pub struct SettlementService {
    backend: Arc<dyn Backend>,
    received_by: Option<String>,
    ledgers: Mutex<HashMap<String, CreditLedger>>,
    in_flight: Mutex<HashSet<String>>,
}

impl SettlementService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        SettlementService {
            backend,
            received_by: None,
            ledgers: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Records who takes payments at this terminal.
    pub fn with_received_by(mut self, received_by: impl Into<String>) -> Self {
        self.received_by = Some(received_by.into());
        self
    }

    fn ledgers(&self) -> MutexGuard<'_, HashMap<String, CreditLedger>> {
        self.ledgers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the sale, or fails if another call holds it.
    fn begin(&self, sale_id: &str) -> ClientResult<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(sale_id.to_string()) {
            return Err(ClientError::PaymentInFlight {
                sale_id: sale_id.to_string(),
            });
        }

        Ok(InFlightGuard {
            sale_id: sale_id.to_string(),
            in_flight: &self.in_flight,
        })
    }

    /// Starts tracking a ledger, replacing any previous one for the sale.
    pub fn track(&self, ledger: CreditLedger) {
        debug!(sale_id = %ledger.sale_id(), balance = %ledger.credit_balance(), "Tracking credit sale");
        self.ledgers().insert(ledger.sale_id().to_string(), ledger);
    }

    /// Stops tracking a sale.
    pub fn forget(&self, sale_id: &str) -> Option<CreditLedger> {
        self.ledgers().remove(sale_id)
    }

    /// A copy of the sale's current ledger.
    pub fn ledger(&self, sale_id: &str) -> Option<CreditLedger> {
        self.ledgers().get(sale_id).cloned()
    }

    pub fn is_in_flight(&self, sale_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(sale_id)
    }

    fn with_ledger<T>(
        &self,
        sale_id: &str,
        f: impl FnOnce(&CreditLedger) -> Result<T, CoreError>,
    ) -> ClientResult<T> {
        let ledgers = self.ledgers();
        let ledger = ledgers
            .get(sale_id)
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        Ok(f(ledger)?)
    }

    /// Checks an amount against the local ledger without sending anything.
    pub fn validate_payment(&self, sale_id: &str, amount: Money) -> ClientResult<()> {
        self.with_ledger(sale_id, |ledger| ledger.validate_payment(amount))
    }

    /// The "pay full balance" amount.
    pub fn full_balance_amount(&self, sale_id: &str) -> ClientResult<Money> {
        self.with_ledger(sale_id, CreditLedger::full_balance_amount)
    }

    /// Local payment history. Never calls the backend.
    pub fn payment_history(&self, sale_id: &str) -> ClientResult<PaymentHistory> {
        self.with_ledger(sale_id, |ledger| Ok(ledger.payment_history()))
    }

    /// Records a settlement.
    ///
    /// ## Behavior
    /// - Rejected locally: nothing is sent. The balance check runs under
    ///   the sale's in-flight guard
    /// - Backend fails: the ledger is unchanged
    /// - Backend accepts: the payment is appended; if the backend's new
    ///   balance differs from the local one the call returns
    ///   [`ClientError::ReconciliationConflict`] and [`refresh`] is needed.
    ///   The same error is returned when the sale stopped being tracked
    ///   while the request was out
    ///
    /// [`refresh`]: SettlementService::refresh
    pub async fn record_payment(
        &self,
        sale_id: &str,
        amount: Money,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> ClientResult<SettlementOutcome> {
        validate_id("sale id", sale_id).map_err(CoreError::from)?;
        if let Some(notes) = notes.as_deref() {
            validate_notes(notes).map_err(CoreError::from)?;
        }

        let _guard = self.begin(sale_id)?;
        self.validate_payment(sale_id, amount)?;
        debug!(sale_id, amount = %amount, %method, "Submitting settlement");

        let request = CreditPaymentRequest {
            sale_id: sale_id.to_string(),
            amount,
            method,
            notes: notes.clone(),
            received_by: self.received_by.clone(),
        };
        let receipt = match self.backend.submit_credit_payment(&request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(sale_id, amount = %amount, error = %e, "Settlement not recorded");
                return Err(e);
            }
        };

        let payment = CreditPayment {
            id: receipt.payment_id.clone(),
            sale_id: sale_id.to_string(),
            amount,
            method,
            received_by: self.received_by.clone(),
            notes,
            created_at: Utc::now(),
        };

        let conflict = |local: Money| ClientError::ReconciliationConflict {
            sale_id: sale_id.to_string(),
            payment_id: receipt.payment_id.clone(),
            local,
            remote: receipt.new_balance,
        };

        let applied = self.ledgers().get_mut(sale_id).map(|ledger| {
            let recorded = ledger.record_payment(payment);
            (recorded, ledger.reconcile(receipt.new_balance))
        });
        // Forgotten while the request was out; the backend still holds the payment.
        let Some((recorded, reconciliation)) = applied else {
            warn!(sale_id, payment_id = %receipt.payment_id, "Settlement accepted for an untracked sale");
            return Err(conflict(Money::zero()));
        };

        match (recorded, reconciliation) {
            (Ok(outcome), Reconciliation::InSync) => {
                info!(
                    sale_id,
                    payment_id = %outcome.payment_id,
                    new_balance = %outcome.new_balance,
                    status = %outcome.credit_status,
                    "Settlement recorded"
                );
                Ok(outcome)
            }
            (Ok(_), Reconciliation::Diverged { local, remote }) => {
                warn!(sale_id, local = %local, remote = %remote, "Balance diverged from backend");
                Err(conflict(local))
            }
            // The backend took a payment the local ledger can't hold.
            (Err(e), _) => {
                warn!(sale_id, error = %e, "Backend accepted a payment the ledger rejected");
                let local = self
                    .ledger(sale_id)
                    .map(|l| l.credit_balance())
                    .unwrap_or_else(Money::zero);
                Err(conflict(local))
            }
        }
    }

    /// Rebuilds the sale's ledger from the backend's history.
    pub async fn refresh(&self, sale_id: &str) -> ClientResult<PaymentHistory> {
        validate_id("sale id", sale_id).map_err(CoreError::from)?;
        let _guard = self.begin(sale_id)?;

        let record = self.backend.fetch_credit_history(sale_id).await?;
        if record.sale.id != sale_id {
            return Err(ClientError::UnexpectedResponse(format!(
                "asked for sale {sale_id}, got {}",
                record.sale.id
            )));
        }

        let ledger = record.into_ledger();
        let history = ledger.payment_history();
        info!(
            sale_id,
            balance = %history.summary.current_balance,
            payments = history.payments.len(),
            "Credit sale refreshed"
        );

        self.track(ledger);
        Ok(history)
    }
}
