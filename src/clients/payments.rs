//! Payment gateway client.
//!
//! Talks to the Stripe REST API for payment intents. The [`PaymentGateway`]
//! trait is the seam the checkout flow depends on.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Upper bound on a single gateway call. Intent creation runs while the
/// order row is locked, so this also bounds how long that lock is held.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment gateway request failed: {0}")]
    Request(String),

    #[error("payment gateway returned an unreadable response: {0}")]
    Response(String),

    #[error("payment gateway error ({status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    #[serde(other)]
    Unknown,
}

impl PaymentIntentStatus {
    /// Terminal intents can no longer be confirmed by the customer.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentIntentStatus::Succeeded | PaymentIntentStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentIntentStatus,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateIntentParams {
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub receipt_email: String,
    pub metadata: BTreeMap<String, String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, params: CreateIntentParams)
    -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    pub fn new(secret_key: SecretString, api_base: impl Into<String>) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        Ok(Self {
            client,
            secret_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    async fn read_intent(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<PaymentIntent>()
            .await
            .map_err(|e| PaymentError::Response(e.to_string()))
    }
}

/// Form fields for `POST /v1/payment_intents`.
pub fn intent_form(params: &CreateIntentParams) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), params.amount.to_string()),
        ("currency".to_string(), params.currency.clone()),
        ("description".to_string(), params.description.clone()),
        ("receipt_email".to_string(), params.receipt_email.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    form.extend(
        params
            .metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
    );
    form
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self, params), fields(amount = params.amount, currency = %params.currency))]
    async fn create_intent(
        &self,
        params: CreateIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&intent_form(&params))
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        let intent = Self::read_intent(response).await?;
        debug!(intent_id = %intent.id, status = ?intent.status, "payment intent created");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .client
            .get(format!("{}/v1/payment_intents/{id}", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| PaymentError::Request(e.to_string()))?;

        Self::read_intent(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_api_base() {
        let client = StripeClient::new(SecretString::from("sk_test"), "https://api.stripe.com/").unwrap();
        assert_eq!(client.api_base, "https://api.stripe.com");
    }

    #[test]
    fn only_succeeded_and_canceled_are_terminal() {
        assert!(PaymentIntentStatus::Succeeded.is_terminal());
        assert!(PaymentIntentStatus::Canceled.is_terminal());
        assert!(!PaymentIntentStatus::RequiresPaymentMethod.is_terminal());
        assert!(!PaymentIntentStatus::Processing.is_terminal());
    }

    #[test]
    fn parses_intent_and_unknown_status() {
        let intent: PaymentIntent = serde_json::from_str(
            r#"{"id":"pi_1","amount":2599,"currency":"gbp","status":"requires_payment_method","client_secret":"pi_1_secret"}"#,
        )
        .unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);
        assert_eq!(intent.client_secret.as_deref(), Some("pi_1_secret"));

        let intent: PaymentIntent = serde_json::from_str(
            r#"{"id":"pi_2","amount":1,"currency":"gbp","status":"something_new","client_secret":null}"#,
        )
        .unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::Unknown);
    }

    #[test]
    fn form_flattens_metadata_and_enables_automatic_methods() {
        let mut metadata = BTreeMap::new();
        metadata.insert("order_number".to_string(), "ORD-20250101-0001".to_string());
        let form = intent_form(&CreateIntentParams {
            amount: 2599,
            currency: "gbp".into(),
            description: "Order ORD-20250101-0001 - Shop".into(),
            receipt_email: "a@example.com".into(),
            metadata,
        });

        assert!(form.contains(&("amount".to_string(), "2599".to_string())));
        assert!(form.contains(&(
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string()
        )));
        assert!(form.contains(&(
            "metadata[order_number]".to_string(),
            "ORD-20250101-0001".to_string()
        )));
    }
}
