//! # HTTP Backend
//!
//! [`Backend`] over the Stockdesk REST API.
//!
//! ## Request Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       HttpBackend Request Path                          │
//! │                                                                         │
//! │  base_url + segments ──► reqwest (timeouts, bearer token)               │
//! │                              │                                          │
//! │            ┌─────────────────┼──────────────────┐                       │
//! │            ▼                 ▼                  ▼                       │
//! │       2xx + JSON        error body         no response                  │
//! │       decode DTO        classify by        Unavailable / Timeout        │
//! │                         code/wording            │                       │
//! │                         → Rejected              │                       │
//! │                                                 ▼                       │
//! │                                   catalog lookup: backoff + retry       │
//! │                                   submissions:    returned as-is        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use stockdesk_core::{CatalogProduct, CoreError};
use tracing::{debug, warn};
use url::Url;

use crate::backend::Backend;
use crate::config::{ClientConfig, RetrySettings};
use crate::error::{ClientError, ClientResult, RejectionKind};
use crate::protocol::{
    CheckoutReceipt, CheckoutRequest, CreditHistoryRecord, CreditPaymentReceipt,
    CreditPaymentRequest, ErrorBody, ProductRecord,
};

/// REST implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    retry: RetrySettings,
}

impl HttpBackend {
    /// Builds the HTTP client from validated configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ClientError::InvalidConfig(format!("Invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(concat!("stockdesk-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpBackend {
            client,
            base_url: config.base_url()?,
            retry: config.retry.clone(),
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        let response = self.client.get(url).send().await?;
        Self::handle_response(response).await
    }

    async fn post_json<T, B>(&self, url: Url, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let response = self.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        if response.status().is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        Err(Self::parse_error(response).await)
    }

    /// Turns a non-2xx response into a classified error.
    async fn parse_error(response: Response) -> ClientError {
        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return e.into(),
        };

        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            if body.code.is_some() || body.text().is_some() {
                let message = body
                    .text()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string());
                return ClientError::Rejected {
                    kind: RejectionKind::classify(body.code.as_deref(), &message),
                    message,
                };
            }
        }

        // A gateway with nothing to say never saw the request.
        if matches!(
            status,
            StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
        ) {
            return ClientError::Unavailable(format!("backend returned {status}"));
        }

        let message = match text.trim() {
            "" => status.to_string(),
            trimmed => trimmed.to_string(),
        };
        ClientError::Rejected {
            kind: RejectionKind::classify(None, &message),
            message,
        }
    }

    /// Creates the exponential backoff for catalog lookups.
    fn create_backoff(&self) -> ExponentialBackoff {
        let initial = Duration::from_millis(self.retry.initial_backoff_ms);
        ExponentialBackoff {
            current_interval: initial,
            initial_interval: initial,
            max_interval: Duration::from_secs(self.retry.max_backoff_secs),
            multiplier: 2.0,
            max_elapsed_time: None, // Bounded by max_retries instead
            ..Default::default()
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn lookup_product(&self, product_id: &str) -> ClientResult<CatalogProduct> {
        let url = self.endpoint(&["products", product_id])?;
        let mut backoff = self.create_backoff();
        let mut retry_count = 0u32;

        loop {
            debug!(product_id, attempt = retry_count, "Looking up product");

            match self.get_json::<ProductRecord>(url.clone()).await {
                Ok(record) => return Ok(record.into_catalog().map_err(CoreError::from)?),
                Err(ClientError::Rejected {
                    kind: RejectionKind::NotFound,
                    ..
                }) => return Err(CoreError::ProductNotFound(product_id.to_string()).into()),
                Err(e) if e.is_retryable() && retry_count < self.retry.max_retries => {
                    let Some(duration) = backoff.next_backoff() else {
                        return Err(e);
                    };
                    retry_count += 1;
                    warn!(product_id, error = %e, ?duration, attempt = retry_count, "Catalog lookup failed, retrying");
                    tokio::time::sleep(duration).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn submit_checkout(&self, request: &CheckoutRequest) -> ClientResult<CheckoutReceipt> {
        let url = self.endpoint(&["sales", "checkout"])?;
        debug!(items = request.items.len(), "Submitting checkout");
        self.post_json(url, request).await
    }

    async fn submit_credit_payment(
        &self,
        request: &CreditPaymentRequest,
    ) -> ClientResult<CreditPaymentReceipt> {
        let url = self.endpoint(&["credit-sales", &request.sale_id, "payments"])?;
        debug!(sale_id = %request.sale_id, amount = %request.amount, "Submitting credit payment");
        self.post_json(url, request).await
    }

    async fn fetch_credit_history(&self, sale_id: &str) -> ClientResult<CreditHistoryRecord> {
        let url = self.endpoint(&["credit-sales", sale_id, "payments"])?;
        debug!(sale_id, "Fetching credit history");

        match self.get_json(url).await {
            Err(ClientError::Rejected {
                kind: RejectionKind::NotFound,
                ..
            }) => Err(CoreError::SaleNotFound(sale_id.to_string()).into()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::HeaderMap as AxumHeaders;
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use stockdesk_core::{CreditStatus, Money, PaymentMethod, Percent};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn backend(base_url: String) -> HttpBackend {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url;
        config.api.token = Some("t0ken".to_string());
        config.retry.initial_backoff_ms = 5;
        config.retry.max_backoff_secs = 1;
        HttpBackend::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let backend = backend("https://shop.example.com/api/".to_string());
        let url = backend.endpoint(&["products", "a b?c"]).unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/products/a%20b%3Fc");
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ClientConfig::default();
        config.api.base_url = "ws://shop.example.com".to_string();
        assert!(HttpBackend::new(&config).unwrap_err().is_config_error());
    }

    #[tokio::test]
    async fn test_lookup_sends_token_and_decodes() {
        let router = Router::new().route(
            "/api/products/{id}",
            get(|Path(id): Path<String>, headers: AxumHeaders| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({
                    "productId": id,
                    "productName": "Rice 5kg",
                    "sku": auth,
                    "unitPrice": 1000,
                    "costPrice": 800.5,
                    "availableQuantity": 12,
                }))
            }),
        );
        let backend = backend(spawn(router).await);

        let product = backend.lookup_product("p-1").await.unwrap();
        assert_eq!(product.product_id, "p-1");
        assert_eq!(product.sku, "Bearer t0ken");
        assert_eq!(product.cost_price, Money::from_minor(80050));
        assert_eq!(product.available_quantity, 12);
    }

    #[tokio::test]
    async fn test_lookup_retries_unavailable_backend() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/api/products/{id}",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        return axum::http::StatusCode::SERVICE_UNAVAILABLE.into_response();
                    }
                    Json(json!({ "productId": "p-1", "productName": "Soap", "unitPrice": 35 }))
                        .into_response()
                }),
            )
            .with_state(hits.clone());
        let backend = backend(spawn(router).await);

        let product = backend.lookup_product("p-1").await.unwrap();
        assert_eq!(product.unit_price, Money::from_major(35));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_lookup_not_found_maps_to_product_not_found() {
        let router = Router::new().route(
            "/api/products/{id}",
            get(|| async {
                (
                    axum::http::StatusCode::NOT_FOUND,
                    Json(json!({ "message": "Product not found" })),
                )
            }),
        );
        let backend = backend(spawn(router).await);

        let err = backend.lookup_product("missing").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(CoreError::ProductNotFound(ref id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_payment_rejection_is_classified_from_body() {
        let router = Router::new().route(
            "/api/credit-sales/{sale_id}/payments",
            post(|| async {
                // Status says nothing useful; the body does.
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Sale is already fully paid" })),
                )
            }),
        );
        let backend = backend(spawn(router).await);

        let err = backend
            .submit_credit_payment(&CreditPaymentRequest {
                sale_id: "s-1".to_string(),
                amount: Money::from_major(10),
                method: PaymentMethod::Cash,
                notes: None,
                received_by: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Rejected {
                kind: RejectionKind::AlreadySettled,
                ..
            }
        ));
        assert!(err.needs_refresh());
    }

    #[tokio::test]
    async fn test_checkout_and_payment_round_trip() {
        let router = Router::new()
            .route(
                "/api/sales/checkout",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["taxPercent"], json!(5.0));
                    Json(json!({
                        "saleId": "s-1",
                        "invoiceNumber": "INV-0042",
                        "total": 1890,
                        "creditAmount": 890,
                    }))
                }),
            )
            .route(
                "/api/credit-sales/{sale_id}/payments",
                post(|Path(sale_id): Path<String>, Json(body): Json<Value>| async move {
                    assert_eq!(body["saleId"], json!(sale_id));
                    Json(json!({
                        "paymentId": "pay-1",
                        "previousBalance": 890,
                        "newBalance": 390,
                        "creditStatus": "PARTIAL",
                        "isFullyPaid": false,
                    }))
                }),
            );
        let backend = backend(spawn(router).await);

        let mut cart = stockdesk_core::Cart::new();
        cart.set_tax_percent(Percent::from_bps(500));
        let receipt = backend
            .submit_checkout(&CheckoutRequest::from_cart(&cart))
            .await
            .unwrap();
        assert_eq!(receipt.credit_amount, Money::from_major(890));
        assert!(receipt.has_credit());

        let paid = backend
            .submit_credit_payment(&CreditPaymentRequest {
                sale_id: "s-1".to_string(),
                amount: Money::from_major(500),
                method: PaymentMethod::Upi,
                notes: Some("first instalment".to_string()),
                received_by: Some("Meera".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(paid.new_balance, Money::from_major(390));
        assert_eq!(paid.credit_status, CreditStatus::Partial);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = ClientConfig::default();
        config.api.base_url = format!("http://{addr}/api/");
        config.retry.max_retries = 0;
        let backend = HttpBackend::new(&config).unwrap();

        let err = backend.fetch_credit_history("s-1").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
