//! HTTP client for the hosted payment service
//!
//! Endpoints: `GET /config`, `POST /create-payment-intent`, `POST /refund`,
//! `GET /refund/{id}`. The service itself is an external collaborator.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::utils::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfig {
    pub publishable_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntent {
    /// Minor currency units (cents)
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub payment_intent_id: String,
    /// Partial refund amount; full refund when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
}

/// Error body: `{"error": "..."}` or `{"error": {"message": "..."}}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Text(String),
    Object { message: String },
}

impl ErrorDetail {
    fn into_message(self) -> String {
        match self {
            ErrorDetail::Text(message) | ErrorDetail::Object { message } => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    base_url: String,
}

impl PaymentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build payment client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn config(&self) -> AppResult<PaymentConfig> {
        let request = self.http.get(self.url("/config"));
        self.send(request, "config").await
    }

    pub async fn create_payment_intent(&self, input: &CreatePaymentIntent) -> AppResult<PaymentIntent> {
        if input.amount <= 0 {
            return Err(AppError::validation("Amount must be positive").with_detail("field", "amount"));
        }
        if input.currency.len() != 3 || !input.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::validation("Currency must be a 3-letter ISO code")
                .with_detail("field", "currency"));
        }
        let request = self.http.post(self.url("/create-payment-intent")).json(input);
        self.send(request, "create_payment_intent").await
    }

    pub async fn refund(&self, input: &RefundRequest) -> AppResult<Refund> {
        if input.payment_intent_id.trim().is_empty() {
            return Err(AppError::validation("Payment intent id is required")
                .with_detail("field", "paymentIntentId"));
        }
        if input.amount.is_some_and(|a| a <= 0) {
            return Err(AppError::validation("Amount must be positive").with_detail("field", "amount"));
        }
        let request = self.http.post(self.url("/refund")).json(input);
        self.send(request, "refund").await
    }

    pub async fn refund_status(&self, refund_id: &str) -> AppResult<Refund> {
        let request = self.http.get(self.url(&format!("/refund/{refund_id}")));
        self.send(request, "refund_status").await.map_err(|e| {
            if e.code == ErrorCode::NotFound {
                AppError::new(ErrorCode::RefundNotFound).with_detail("refundId", refund_id)
            } else {
                e
            }
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> AppResult<T> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(operation = %operation, error = %e, "Payment service unreachable");
            if e.is_timeout() {
                AppError::new(ErrorCode::TimeoutError)
            } else {
                AppError::with_message(ErrorCode::NetworkError, "Payment service is unavailable")
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                tracing::error!(operation = %operation, error = %e, "Invalid payment service response");
                AppError::with_message(ErrorCode::PaymentFailed, "Invalid response from payment service")
            });
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.error.into_message())
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());
        tracing::warn!(operation = %operation, status = %status, error = %message, "Payment service error");

        Err(match status {
            StatusCode::NOT_FOUND => AppError::not_found("Payment resource"),
            _ => AppError::with_message(ErrorCode::PaymentFailed, message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn fake_service() -> String {
        let app = Router::new()
            .route("/config", get(|| async { Json(json!({"publishableKey": "pk_test_123"})) }))
            .route(
                "/create-payment-intent",
                post(|Json(body): Json<Value>| async move {
                    if body["amount"].as_i64() == Some(13) {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"error": {"message": "Card declined"}})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({"clientSecret": "pi_1_secret", "paymentIntentId": "pi_1"})),
                    )
                }),
            )
            .route(
                "/refund",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "id": "re_1",
                        "status": "succeeded",
                        "amount": body["amount"],
                        "paymentIntentId": body["paymentIntentId"],
                    }))
                }),
            )
            .route(
                "/refund/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "re_1" {
                        (StatusCode::OK, Json(json!({"id": "re_1", "status": "succeeded"})))
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"error": "No such refund"})))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_payment_flow() {
        let client = PaymentClient::new(fake_service().await, Duration::from_secs(5)).unwrap();
        assert!(!client.base_url().ends_with('/'));

        let config = client.config().await.unwrap();
        assert_eq!(config.publishable_key, "pk_test_123");

        let intent = client
            .create_payment_intent(&CreatePaymentIntent {
                amount: 1250,
                currency: "usd".into(),
                description: Some("Order 42".into()),
            })
            .await
            .unwrap();
        assert_eq!(intent.payment_intent_id, "pi_1");

        let refund = client
            .refund(&RefundRequest {
                payment_intent_id: "pi_1".into(),
                amount: Some(500),
            })
            .await
            .unwrap();
        assert_eq!(refund.amount, Some(500));
        assert_eq!(refund.payment_intent_id.as_deref(), Some("pi_1"));

        assert_eq!(client.refund_status("re_1").await.unwrap().status, "succeeded");
        let err = client.refund_status("re_404").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RefundNotFound);
    }

    #[tokio::test]
    async fn test_errors_are_mapped() {
        let client = PaymentClient::new(fake_service().await, Duration::from_secs(5)).unwrap();
        let declined = client
            .create_payment_intent(&CreatePaymentIntent {
                amount: 13,
                currency: "eur".into(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(declined.code, ErrorCode::PaymentFailed);
        assert_eq!(declined.message, "Card declined");

        let invalid = client
            .create_payment_intent(&CreatePaymentIntent {
                amount: 100,
                currency: "euro".into(),
                description: None,
            })
            .await
            .unwrap_err();
        assert_eq!(invalid.code, ErrorCode::ValidationFailed);

        // nothing listens on port 9 (discard)
        let offline = PaymentClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = offline.config().await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::NetworkError | ErrorCode::TimeoutError));
    }
}
