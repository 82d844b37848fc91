use std::sync::Arc;

use crate::{
    clients::{embeddings::EmbeddingProvider, payments::PaymentGateway},
    config::AppConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub payments: Arc<dyn PaymentGateway>,
    pub embeddings: Option<Arc<dyn EmbeddingProvider>>,
}
