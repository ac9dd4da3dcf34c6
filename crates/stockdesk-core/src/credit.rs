//! # Credit Settlement Ledger
//!
//! Per-sale tracker for the deferred part of a sale: the payments received
//! against it and the balance and status derived from them.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Credit Ledger                                    │
//! │                                                                         │
//! │  credit_amount (fixed at sale)                                          │
//! │        │                                                                │
//! │        │   payments (append-only)                                       │
//! │        │   ┌────────┬────────┬────────┐                                 │
//! │        │   │ 2000   │ 1500   │ 1500   │ ──► total_paid = 5000           │
//! │        │   └────────┴────────┴────────┘                                 │
//! │        ▼                                                                │
//! │  balance = max(0, credit_amount − total_paid)                           │
//! │  status  = CreditStatus::derive(credit_amount, total_paid)              │
//! │                                                                         │
//! │  Balance and status are recomputed after every accepted payment.        │
//! │  A rejected payment changes nothing.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CreditPayment, CreditSale, CreditStatus};

// =============================================================================
// Ledger
// =============================================================================

/// Settlement state for one credit sale.
///
/// Payments can only be appended through [`CreditLedger::record_payment`];
/// readers get a shared slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditLedger {
    sale: CreditSale,
    payments: Vec<CreditPayment>,
}

impl CreditLedger {
    /// Opens a ledger for a sale with nothing paid against it yet.
    pub fn open(sale: CreditSale) -> Self {
        Self::from_history(sale, Vec::new())
    }

    /// Rebuilds a ledger from an authoritative payment history.
    ///
    /// Balance and status on `sale` are overwritten with values derived from
    /// `payments`; the history is sorted oldest first.
    pub fn from_history(mut sale: CreditSale, mut payments: Vec<CreditPayment>) -> Self {
        payments.sort_by_key(|p| p.created_at);

        let total_paid: Money = payments.iter().map(|p| p.amount).sum();
        sale.credit_balance = (sale.credit_amount - total_paid).clamp_non_negative();
        sale.credit_status = CreditStatus::derive(sale.credit_amount, total_paid);

        CreditLedger { sale, payments }
    }

    /// The sale with its current derived balance and status.
    pub fn sale(&self) -> &CreditSale {
        &self.sale
    }

    pub fn sale_id(&self) -> &str {
        &self.sale.id
    }

    /// Accepted payments, oldest first.
    pub fn payments(&self) -> &[CreditPayment] {
        &self.payments
    }

    pub fn credit_balance(&self) -> Money {
        self.sale.credit_balance
    }

    pub fn status(&self) -> CreditStatus {
        self.sale.credit_status
    }

    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Checks a prospective settlement amount without changing anything.
    ///
    /// ## Rules
    /// - A sale with no credit accepts nothing
    /// - A fully paid sale accepts nothing
    /// - Amount must be positive
    /// - Amount must not exceed the current balance
    pub fn validate_payment(&self, amount: Money) -> CoreResult<()> {
        match self.sale.credit_status {
            CreditStatus::None => {
                return Err(CoreError::NoCreditExtended {
                    sale_id: self.sale.id.clone(),
                })
            }
            CreditStatus::Paid => {
                return Err(CoreError::SaleAlreadySettled {
                    sale_id: self.sale.id.clone(),
                })
            }
            CreditStatus::Pending | CreditStatus::Partial => {}
        }

        if !amount.is_positive() {
            return Err(CoreError::PaymentNotPositive { requested: amount });
        }

        if amount > self.sale.credit_balance {
            return Err(CoreError::PaymentExceedsBalance {
                requested: amount,
                max_allowed: self.sale.credit_balance,
            });
        }

        Ok(())
    }

    /// Validates and appends a payment, then re-derives balance and status.
    ///
    /// On error the ledger is untouched.
    pub fn record_payment(&mut self, payment: CreditPayment) -> CoreResult<SettlementOutcome> {
        if payment.sale_id != self.sale.id {
            return Err(CoreError::PaymentSaleMismatch {
                sale_id: self.sale.id.clone(),
                payment_sale_id: payment.sale_id,
            });
        }
        self.validate_payment(payment.amount)?;

        let previous_balance = self.sale.credit_balance;
        let payment_id = payment.id.clone();
        self.payments.push(payment);

        let total_paid = self.total_paid();
        self.sale.credit_balance = (self.sale.credit_amount - total_paid).clamp_non_negative();
        self.sale.credit_status = CreditStatus::derive(self.sale.credit_amount, total_paid);

        Ok(SettlementOutcome {
            payment_id,
            previous_balance,
            new_balance: self.sale.credit_balance,
            credit_status: self.sale.credit_status,
            is_fully_paid: self.sale.credit_status == CreditStatus::Paid,
        })
    }

    /// The amount that settles the sale in one go.
    ///
    /// Fails the same way any other amount would on a settled or
    /// non-credit sale.
    pub fn full_balance_amount(&self) -> CoreResult<Money> {
        let amount = self.sale.credit_balance;
        self.validate_payment(amount)?;
        Ok(amount)
    }

    /// Chronological payments with a summary.
    pub fn payment_history(&self) -> PaymentHistory {
        PaymentHistory {
            sale_id: self.sale.id.clone(),
            invoice_number: self.sale.invoice_number.clone(),
            payments: self.payments.clone(),
            summary: CreditSummary {
                original_credit: self.sale.credit_amount,
                total_paid: self.total_paid(),
                current_balance: self.sale.credit_balance,
                credit_status: self.sale.credit_status,
            },
        }
    }

    /// Compares the local balance with an authoritative one.
    pub fn reconcile(&self, remote_balance: Money) -> Reconciliation {
        if remote_balance == self.sale.credit_balance {
            Reconciliation::InSync
        } else {
            Reconciliation::Diverged {
                local: self.sale.credit_balance,
                remote: remote_balance,
            }
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Result of an accepted settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    pub payment_id: String,
    pub previous_balance: Money,
    pub new_balance: Money,
    pub credit_status: CreditStatus,
    pub is_fully_paid: bool,
}

/// Totals shown above a sale's payment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreditSummary {
    pub original_credit: Money,
    pub total_paid: Money,
    pub current_balance: Money,
    pub credit_status: CreditStatus,
}

/// A sale's payments, oldest first, with their summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub sale_id: String,
    pub invoice_number: String,
    pub payments: Vec<CreditPayment>,
    pub summary: CreditSummary,
}

/// Outcome of comparing the local balance with the backend's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    InSync,
    Diverged { local: Money, remote: Money },
}

impl Reconciliation {
    pub fn is_in_sync(&self) -> bool {
        matches!(self, Reconciliation::InSync)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::{Duration, Utc};

    fn credit_sale(credit: i64) -> CreditSale {
        CreditSale::new(
            "sale-1",
            "INV-0001",
            Money::from_major(credit + 1000),
            Money::from_major(credit),
            Utc::now() - Duration::days(2),
        )
    }

    fn payment(id: &str, amount: i64) -> CreditPayment {
        CreditPayment {
            id: id.to_string(),
            sale_id: "sale-1".to_string(),
            amount: Money::from_major(amount),
            method: PaymentMethod::Cash,
            received_by: Some("counter-1".to_string()),
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_partial_then_full_settlement() {
        let mut ledger = CreditLedger::open(credit_sale(5000));
        assert_eq!(ledger.status(), CreditStatus::Pending);

        let first = ledger.record_payment(payment("p1", 2000)).unwrap();
        assert_eq!(first.previous_balance, Money::from_major(5000));
        assert_eq!(first.new_balance, Money::from_major(3000));
        assert_eq!(first.credit_status, CreditStatus::Partial);
        assert!(!first.is_fully_paid);

        let second = ledger.record_payment(payment("p2", 3000)).unwrap();
        assert_eq!(second.new_balance, Money::zero());
        assert_eq!(second.credit_status, CreditStatus::Paid);
        assert!(second.is_fully_paid);
        assert_eq!(ledger.payments().len(), 2);
    }

    #[test]
    fn test_overpayment_rejected_without_mutation() {
        let mut ledger = CreditLedger::open(credit_sale(5000));
        ledger.record_payment(payment("p1", 2000)).unwrap();
        let before = ledger.clone();

        let err = ledger.record_payment(payment("p2", 3001)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsBalance { max_allowed, .. } if max_allowed == Money::from_major(3000)
        ));
        assert_eq!(
            err.to_string(),
            "Amount exceeds outstanding balance of 3000.00"
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut ledger = CreditLedger::open(credit_sale(5000));

        assert!(matches!(
            ledger.record_payment(payment("p1", 0)),
            Err(CoreError::PaymentNotPositive { .. })
        ));
        assert!(ledger.validate_payment(Money::from_major(-10)).is_err());
        assert_eq!(ledger.credit_balance(), Money::from_major(5000));
        assert!(ledger.payments().is_empty());
    }

    #[test]
    fn test_paid_is_terminal() {
        let mut ledger = CreditLedger::open(credit_sale(100));
        ledger.record_payment(payment("p1", 100)).unwrap();

        for amount in [1, 100] {
            assert!(matches!(
                ledger.record_payment(payment("px", amount)),
                Err(CoreError::SaleAlreadySettled { .. })
            ));
        }
        assert!(matches!(
            ledger.full_balance_amount(),
            Err(CoreError::SaleAlreadySettled { .. })
        ));
        assert_eq!(ledger.status(), CreditStatus::Paid);
    }

    #[test]
    fn test_no_credit_sale_rejects_everything() {
        let ledger = CreditLedger::open(credit_sale(0));
        assert_eq!(ledger.status(), CreditStatus::None);
        assert!(matches!(
            ledger.validate_payment(Money::from_major(1)),
            Err(CoreError::NoCreditExtended { .. })
        ));
    }

    #[test]
    fn test_payment_for_other_sale_rejected() {
        let mut ledger = CreditLedger::open(credit_sale(500));
        let mut stray = payment("p1", 100);
        stray.sale_id = "sale-2".to_string();

        assert!(matches!(
            ledger.record_payment(stray),
            Err(CoreError::PaymentSaleMismatch { .. })
        ));
        assert!(ledger.payments().is_empty());
    }

    #[test]
    fn test_balance_invariant_holds_at_every_step() {
        let credit = Money::from_major(1000);
        let mut ledger = CreditLedger::open(credit_sale(1000));

        for (i, amount) in [100, 250, 333, 317].into_iter().enumerate() {
            ledger
                .record_payment(payment(&format!("p{}", i), amount))
                .unwrap();

            let paid: Money = ledger.payments().iter().map(|p| p.amount).sum();
            assert_eq!(ledger.credit_balance(), (credit - paid).clamp_non_negative());
            assert_eq!(ledger.status(), CreditStatus::derive(credit, paid));
        }
        assert_eq!(ledger.status(), CreditStatus::Paid);
    }

    #[test]
    fn test_full_balance_amount() {
        let mut ledger = CreditLedger::open(credit_sale(5000));
        ledger.record_payment(payment("p1", 1234)).unwrap();

        let full = ledger.full_balance_amount().unwrap();
        assert_eq!(full, Money::from_major(3766));

        let outcome = ledger.record_payment(payment("p2", 3766)).unwrap();
        assert!(outcome.is_fully_paid);
    }

    #[test]
    fn test_payment_history_summary() {
        let mut ledger = CreditLedger::open(credit_sale(5000));
        ledger.record_payment(payment("p1", 2000)).unwrap();

        let history = ledger.payment_history();
        assert_eq!(history.sale_id, "sale-1");
        assert_eq!(history.payments.len(), 1);
        assert_eq!(history.summary.original_credit, Money::from_major(5000));
        assert_eq!(history.summary.total_paid, Money::from_major(2000));
        assert_eq!(history.summary.current_balance, Money::from_major(3000));
        assert_eq!(history.summary.credit_status, CreditStatus::Partial);

        // Projection only.
        assert_eq!(ledger.payment_history(), history);
    }

    #[test]
    fn test_from_history_rederives_and_sorts() {
        let mut stale = credit_sale(5000);
        stale.credit_balance = Money::from_major(5000);

        let mut late = payment("p2", 1000);
        late.created_at = Utc::now();
        let mut early = payment("p1", 500);
        early.created_at = Utc::now() - Duration::hours(3);

        let ledger = CreditLedger::from_history(stale, vec![late, early]);
        assert_eq!(ledger.credit_balance(), Money::from_major(3500));
        assert_eq!(ledger.status(), CreditStatus::Partial);
        assert_eq!(ledger.payments()[0].id, "p1");
    }

    #[test]
    fn test_reconcile() {
        let mut ledger = CreditLedger::open(credit_sale(5000));
        ledger.record_payment(payment("p1", 2000)).unwrap();

        assert!(ledger.reconcile(Money::from_major(3000)).is_in_sync());
        assert_eq!(
            ledger.reconcile(Money::from_major(2500)),
            Reconciliation::Diverged {
                local: Money::from_major(3000),
                remote: Money::from_major(2500),
            }
        );
    }
}
