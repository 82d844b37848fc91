use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Category, Product};

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryWithProducts {
    pub category: Category,
    pub products: Vec<Product>,
}
