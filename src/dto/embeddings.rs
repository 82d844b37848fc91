use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct EmbeddingRun {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmbeddingStatus {
    pub total: u64,
    pub with_embeddings: u64,
    pub without_embeddings: u64,
    pub percent_complete: u64,
}
