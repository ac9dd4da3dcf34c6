//! # Client Error Types
//!
//! Error types for backend calls and the services built on them.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Backend             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Unavailable    │  │  Rejected { kind }      │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  UnexpectedResponse     │ │
//! │  │  ConfigLoad/Save│  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────────────────────────────┐  │
//! │  │     Domain      │  │      Settlement                             │  │
//! │  │                 │  │                                             │  │
//! │  │  Core(CoreError)│  │  ReconciliationConflict (refresh required)  │  │
//! │  │                 │  │  PaymentInFlight                            │  │
//! │  └─────────────────┘  └─────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use stockdesk_core::{CoreError, Money};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Why the backend turned a request down.
///
/// Classified from the response body, never from the HTTP status alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The request was malformed or broke a business rule.
    Validation,
    /// The product or sale does not exist.
    NotFound,
    /// The sale has no outstanding balance.
    AlreadySettled,
    /// Anything the wording didn't reveal.
    Other,
}

impl RejectionKind {
    /// Classifies a rejection from the body's `code` field, falling back to
    /// the message wording.
    ///
    /// ## Example
    /// ```rust
    /// use stockdesk_client::error::RejectionKind;
    ///
    /// assert_eq!(RejectionKind::classify(Some("NOT_FOUND"), ""), RejectionKind::NotFound);
    /// assert_eq!(
    ///     RejectionKind::classify(None, "Amount exceeds outstanding balance of 3000.00"),
    ///     RejectionKind::Validation
    /// );
    /// ```
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        if let Some(code) = code {
            match code.trim().to_uppercase().as_str() {
                "VALIDATION_ERROR" | "VALIDATION" | "BAD_REQUEST" | "INVALID_INPUT" => {
                    return RejectionKind::Validation
                }
                "NOT_FOUND" | "SALE_NOT_FOUND" | "PRODUCT_NOT_FOUND" => {
                    return RejectionKind::NotFound
                }
                "ALREADY_PAID" | "ALREADY_SETTLED" | "FULLY_PAID" => {
                    return RejectionKind::AlreadySettled
                }
                _ => {}
            }
        }

        let message = message.to_lowercase();
        if message.contains("not found") {
            RejectionKind::NotFound
        } else if message.contains("already") && (message.contains("paid") || message.contains("settled")) {
            RejectionKind::AlreadySettled
        } else if ["exceeds", "must be", "invalid", "required", "insufficient"]
            .iter()
            .any(|w| message.contains(w))
        {
            RejectionKind::Validation
        } else {
            RejectionKind::Other
        }
    }
}

/// Client error type covering all backend-facing failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Errors are categorized for different handling strategies
/// - A failed call never leaves local state half-updated
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid backend URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The backend could not be reached; nothing was submitted.
    #[error("Could not submit, backend unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time.
    #[error("Backend did not respond in time")]
    Timeout,

    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// The backend refused the request.
    #[error("Backend rejected request: {message}")]
    Rejected { kind: RejectionKind, message: String },

    /// The response body did not match the expected shape.
    #[error("Unexpected backend response: {0}")]
    UnexpectedResponse(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Local validation failed before anything was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Settlement Errors
    // =========================================================================
    /// The backend's balance differs from the local derivation.
    ///
    /// The payment was accepted; call `refresh` for the sale.
    #[error("Balance for sale {sale_id} diverged after payment {payment_id}: local {local}, backend {remote}")]
    ReconciliationConflict {
        sale_id: String,
        payment_id: String,
        local: Money,
        remote: Money,
    },

    /// Another payment for the same sale has not finished.
    #[error("A payment for sale {sale_id} is already in progress")]
    PaymentInFlight { sale_id: String },
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::UnexpectedResponse(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidConfig(err.to_string())
        } else {
            ClientError::Unavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::UnexpectedResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl ClientError {
    /// Returns true if the request never reached a decision and can be retried.
    ///
    /// Only idempotent lookups are retried automatically; submissions surface
    /// the error to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Unavailable(_) | ClientError::Timeout)
    }

    /// Returns true if the caller can fix the input and try again.
    pub fn is_validation(&self) -> bool {
        match self {
            ClientError::Rejected { kind, .. } => *kind == RejectionKind::Validation,
            ClientError::Core(err) => err.is_input_error(),
            _ => false,
        }
    }

    /// Returns true if the local ledger should be rebuilt from the backend.
    pub fn needs_refresh(&self) -> bool {
        matches!(
            self,
            ClientError::ReconciliationConflict { .. }
                | ClientError::Rejected {
                    kind: RejectionKind::AlreadySettled,
                    ..
                }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}
