use std::env;

use anyhow::Context;
use secrecy::SecretString;

use crate::entity::enums::DeliveryMethod;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
    pub identity_webhook_secret: Option<SecretString>,
    pub payments: PaymentConfig,
    pub embeddings: Option<EmbeddingConfig>,
    pub checkout: CheckoutConfig,
}

/// Key material used to verify identity-provider session tokens.
#[derive(Debug, Clone)]
pub enum AuthConfig {
    /// RS256 public key in PEM form.
    RsaPem(String),
    /// HS256 shared secret.
    Secret(SecretString),
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub secret_key: SecretString,
    pub api_base: String,
    pub currency: String,
    pub store_name: String,
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: SecretString,
    pub api_base: String,
    pub model: String,
}

/// Delivery fees in minor units.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    pub delivery_fee: i64,
    pub shipping_fee: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            delivery_fee: 350,
            shipping_fee: 0,
        }
    }
}

impl CheckoutConfig {
    pub fn fee_for(&self, method: DeliveryMethod) -> i64 {
        match method {
            DeliveryMethod::Pickup => 0,
            DeliveryMethod::Delivery => self.delivery_fee,
            DeliveryMethod::Shipping => self.shipping_fee,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = database_url()?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let auth = match (env::var("AUTH_JWT_PUBLIC_KEY"), env::var("JWT_SECRET")) {
            (Ok(pem), _) => AuthConfig::RsaPem(pem),
            (Err(_), Ok(secret)) => AuthConfig::Secret(SecretString::from(secret)),
            _ => anyhow::bail!("either AUTH_JWT_PUBLIC_KEY or JWT_SECRET must be set"),
        };

        let payments = PaymentConfig {
            secret_key: SecretString::from(
                env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY is not set")?,
            ),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "gbp".to_string()),
            store_name: env::var("STORE_NAME").unwrap_or_else(|_| "Dymchurch Crafters".to_string()),
        };

        let embeddings = env::var("OPENAI_API_KEY").ok().map(|key| EmbeddingConfig {
            api_key: SecretString::from(key),
            api_base: env::var("EMBEDDING_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
        });

        let defaults = CheckoutConfig::default();
        let checkout = CheckoutConfig {
            delivery_fee: parse_fee("DELIVERY_FEE")?.unwrap_or(defaults.delivery_fee),
            shipping_fee: parse_fee("SHIPPING_FEE")?.unwrap_or(defaults.shipping_fee),
        };

        Ok(Self {
            database_url,
            host,
            port,
            auth,
            identity_webhook_secret: env::var("IDENTITY_WEBHOOK_SECRET")
                .ok()
                .map(SecretString::from),
            payments,
            embeddings,
            checkout,
        })
    }
}

/// Just the database URL, for the maintenance binaries.
pub fn database_url() -> anyhow::Result<String> {
    env::var("DATABASE_URL").context("DATABASE_URL is not set")
}

fn parse_fee(key: &str) -> anyhow::Result<Option<i64>> {
    match env::var(key) {
        Ok(raw) => {
            let fee = raw
                .parse::<i64>()
                .with_context(|| format!("{key} must be an integer amount in minor units"))?;
            anyhow::ensure!(fee >= 0, "{key} cannot be negative");
            Ok(Some(fee))
        }
        Err(_) => Ok(None),
    }
}
