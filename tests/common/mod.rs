#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, LazyLock, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use crafters_market::{
    clients::{
        embeddings::{EmbeddingError, EmbeddingProvider},
        payments::{
            CreateIntentParams, PaymentError, PaymentGateway, PaymentIntent, PaymentIntentStatus,
        },
    },
    config::{AppConfig, AuthConfig, CheckoutConfig, PaymentConfig},
    db::{DbPool, create_pool, orm_from_pool, run_migrations},
    entity::{
        crafters::{ActiveModel as CrafterActive, Model as CrafterModel},
        enums::{ProductCategory, UserRole},
        products::{ActiveModel as ProductActive, Model as ProductModel},
        users::{ActiveModel as UserActive, Model as UserModel},
    },
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use secrecy::SecretString;
use uuid::Uuid;

pub const WEBHOOK_SECRET: &str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

/// Serializes tests that generate order numbers against the shared database.
pub static ORDER_LOCK: LazyLock<tokio::sync::Mutex<()>> =
    LazyLock::new(|| tokio::sync::Mutex::new(()));

/// Payment gateway that keeps intents in memory.
#[derive(Default)]
pub struct MemoryGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    created: AtomicUsize,
}

impl MemoryGateway {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn set_status(&self, id: &str, status: PaymentIntentStatus) {
        if let Some(intent) = self.intents.lock().unwrap().get_mut(id) {
            intent.status = status;
        }
    }
}

#[async_trait]
impl PaymentGateway for MemoryGateway {
    async fn create_intent(
        &self,
        params: CreateIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_test_{n}_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            id: id.clone(),
            amount: params.amount,
            currency: params.currency,
            status: PaymentIntentStatus::RequiresPaymentMethod,
            client_secret: Some(format!("{id}_secret")),
        };
        self.intents.lock().unwrap().insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.intents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| PaymentError::Api {
                status: 404,
                message: format!("No such payment_intent: '{id}'"),
            })
    }
}

/// Embeds text as counts of a few marker words.
pub struct KeywordEmbeddings;

pub const KEYWORDS: [&str; 4] = ["mug", "scarf", "oak", "silver"];

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddings {
    fn model(&self) -> &str {
        "keyword-test"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lower = text.to_lowercase();
        Ok(KEYWORDS
            .iter()
            .map(|k| lower.matches(k).count() as f32 + 0.01)
            .collect())
    }
}

pub struct TestContext {
    pub state: AppState,
    pub gateway: Arc<MemoryGateway>,
}

pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        auth: AuthConfig::Secret(SecretString::from("test-secret")),
        identity_webhook_secret: Some(SecretString::from(WEBHOOK_SECRET)),
        payments: PaymentConfig {
            secret_key: SecretString::from("sk_test"),
            api_base: "http://localhost".into(),
            currency: "gbp".into(),
            store_name: "Test Crafters".into(),
        },
        embeddings: None,
        checkout: CheckoutConfig::default(),
    }
}

pub fn state_with(pool: DbPool, config: AppConfig, gateway: Arc<MemoryGateway>) -> AppState {
    AppState {
        orm: orm_from_pool(&pool),
        pool,
        config: Arc::new(config),
        payments: gateway,
        embeddings: Some(Arc::new(KeywordEmbeddings)),
    }
}

/// Connects and migrates, or returns `None` when no database is configured.
pub async fn setup() -> anyhow::Result<Option<TestContext>> {
    let Some(url) = database_url() else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
        return Ok(None);
    };

    let pool = create_pool(&url).await?;
    run_migrations(&pool).await?;

    let gateway = Arc::new(MemoryGateway::default());
    let state = state_with(pool, test_config(&url), gateway.clone());
    Ok(Some(TestContext { state, gateway }))
}

pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub async fn create_user(state: &AppState, role: UserRole) -> anyhow::Result<UserModel> {
    let identity_id = unique("user");
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        identity_id: Set(identity_id.clone()),
        email: Set(format!("{identity_id}@example.com")),
        first_name: Set(Some("Test".into())),
        last_name: Set(None),
        image_url: Set(None),
        role: Set(role),
        onboarding_complete: Set(true),
        crafter_id: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(user)
}

pub async fn create_crafter(state: &AppState, verified: bool) -> anyhow::Result<CrafterModel> {
    let crafter = CrafterActive {
        id: Set(Uuid::new_v4()),
        name: Set(unique("Crafter")),
        specialty: Set("Pottery".into()),
        location: Set("Dymchurch".into()),
        bio: Set("Makes things".into()),
        email: Set(None),
        phone: Set(None),
        profile_image: Set(None),
        verified: Set(verified),
        products_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(crafter)
}

pub async fn create_product(
    state: &AppState,
    crafter: &CrafterModel,
    name: &str,
    price: i64,
    in_stock: bool,
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        crafter_id: Set(crafter.id),
        name: Set(name.to_string()),
        price: Set(price),
        category: Set(ProductCategory::Pottery),
        description: Set(format!("Handmade {name}")),
        materials: Set("Stoneware".into()),
        dimensions: Set(None),
        in_stock: Set(in_stock),
        featured: Set(false),
        images: Set(vec![]),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

/// Links `user` to `crafter` and returns the caller as the extractor would.
pub async fn link_crafter(
    state: &AppState,
    user: UserModel,
    crafter: &CrafterModel,
) -> anyhow::Result<AuthUser> {
    let mut active: UserActive = user.into();
    active.crafter_id = Set(Some(crafter.id));
    active.role = Set(UserRole::Crafter);
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;
    Ok(caller(user))
}

pub fn caller(user: UserModel) -> AuthUser {
    AuthUser {
        identity_id: user.identity_id.clone(),
        user: Some(user),
    }
}
