use std::cmp::Ordering;
use std::collections::HashMap;

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::{
    clients::embeddings::cosine_similarity,
    dto::search::{ScoredProduct, SearchSort, SemanticSearchRequest, SemanticSearchResults},
    entity::product_embeddings::{Column as EmbeddingCol, Entity as ProductEmbeddings},
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
    services::product_service::visible_products,
    state::AppState,
};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 50;

#[instrument(skip(state, payload))]
pub async fn semantic_search(
    state: &AppState,
    payload: SemanticSearchRequest,
) -> AppResult<ApiResponse<SemanticSearchResults>> {
    let query = payload
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".into()))?
        .to_string();
    let provider = state
        .embeddings
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Semantic search is not configured".into()))?;

    let query_vector = provider.embed(&query).await?;

    let products: Vec<Product> = visible_products()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(p, c)| Product::from_entity(p, c.as_ref()))
        .filter(|p| matches_filters(p, &payload))
        .collect();

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut vectors: HashMap<Uuid, Vec<f32>> = ProductEmbeddings::find()
        .filter(EmbeddingCol::ProductId.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|e| (e.product_id, e.embedding))
        .collect();

    let candidates: Vec<(Product, Vec<f32>)> = products
        .into_iter()
        .filter_map(|p| vectors.remove(&p.id).map(|v| (p, v)))
        .collect();
    debug!(candidates = candidates.len(), "ranking products");

    let limit = payload.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let items = rank(
        &query_vector,
        candidates,
        payload.sort_by.unwrap_or_default(),
        limit,
    );

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success(
        "Search results",
        SemanticSearchResults { query, items },
        Some(meta),
    ))
}

pub fn matches_filters(product: &Product, filters: &SemanticSearchRequest) -> bool {
    filters.category.is_none_or(|c| product.category == c)
        && filters.crafter_id.is_none_or(|id| product.crafter_id == id)
        && filters.min_price.is_none_or(|min| product.price >= min)
        && filters.max_price.is_none_or(|max| product.price <= max)
}

/// Keeps the `limit` most similar products, then orders them by `sort`.
pub fn rank(
    query: &[f32],
    candidates: Vec<(Product, Vec<f32>)>,
    sort: SearchSort,
    limit: usize,
) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = candidates
        .into_iter()
        .map(|(product, vector)| ScoredProduct {
            score: cosine_similarity(query, &vector),
            product,
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);

    match sort {
        SearchSort::Relevance => {}
        SearchSort::Newest => scored.sort_by(|a, b| b.product.created_at.cmp(&a.product.created_at)),
        SearchSort::PriceAsc => scored.sort_by_key(|s| s.product.price),
        SearchSort::PriceDesc => scored.sort_by(|a, b| b.product.price.cmp(&a.product.price)),
        SearchSort::NameAsc => scored.sort_by(|a, b| {
            a.product
                .name
                .to_lowercase()
                .cmp(&b.product.name.to_lowercase())
        }),
    }
    scored
}
