use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::enums::ProductCategory, models::Product};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SearchSort {
    #[default]
    Relevance,
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SemanticSearchRequest {
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub category: Option<ProductCategory>,
    pub crafter_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<SearchSort>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: Product,
    pub score: f32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SemanticSearchResults {
    pub query: String,
    pub items: Vec<ScoredProduct>,
}
