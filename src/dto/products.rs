use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity::enums::ProductCategory, models::Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    /// Minor currency units.
    pub price: i64,
    pub category: ProductCategory,
    pub description: String,
    pub materials: String,
    pub dimensions: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
    pub category: Option<ProductCategory>,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub dimensions: Option<String>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}
