//! # stockdesk-client: Backend Seam for Stockdesk
//!
//! Connects the pure pricing and settlement logic in `stockdesk-core` to the
//! Stockdesk REST backend.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockdesk-client                                 │
//! │                                                                         │
//! │  ┌───────────────┐     ┌───────────────┐     ┌───────────────────────┐ │
//! │  │  checkout.rs  │     │ settlement.rs │     │     backend.rs        │ │
//! │  │               │     │               │     │                       │ │
//! │  │ CheckoutSvc   │────►│ SettlementSvc │────►│ trait Backend         │ │
//! │  │ add_product   │     │ record_payment│     │   └── http.rs         │ │
//! │  │ checkout      │     │ refresh       │     │       HttpBackend     │ │
//! │  └───────────────┘     └───────────────┘     └───────────────────────┘ │
//! │                                                                         │
//! │  ┌───────────────┐     ┌───────────────┐     ┌───────────────────────┐ │
//! │  │  protocol.rs  │     │   config.rs   │     │      error.rs         │ │
//! │  │  JSON bodies  │     │  TOML + env   │     │  ClientError          │ │
//! │  └───────────────┘     └───────────────┘     └───────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use stockdesk_client::{CheckoutService, ClientConfig, HttpBackend, SettlementService};
//! use stockdesk_core::{Cart, Money, PaymentMethod};
//!
//! # async fn run() -> stockdesk_client::ClientResult<()> {
//! let config = ClientConfig::load(None)?;
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let checkout = CheckoutService::new(backend.clone());
//! let settlement = SettlementService::new(backend).with_received_by(config.received_by());
//!
//! let mut cart = Cart::new();
//! checkout.add_product(&mut cart, "p-1", 2).await?;
//! let outcome = checkout.checkout(&mut cart).await?;
//!
//! if let Some(ledger) = outcome.ledger {
//!     let sale_id = ledger.sale_id().to_string();
//!     settlement.track(ledger);
//!     settlement
//!         .record_payment(&sale_id, Money::from_major(500), PaymentMethod::Cash, None)
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod checkout;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod settlement;

#[cfg(test)]
mod test_support;

pub use backend::Backend;
pub use checkout::{CheckoutOutcome, CheckoutService};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, RejectionKind};
pub use http::HttpBackend;
pub use settlement::SettlementService;
