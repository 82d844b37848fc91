use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Crafter, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CrafterSetupRequest {
    pub business_name: String,
    pub bio: String,
    pub specialty: String,
    pub phone: Option<String>,
    pub location: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CrafterList {
    #[schema(value_type = Vec<Crafter>)]
    pub items: Vec<Crafter>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CrafterWithProducts {
    #[serde(flatten)]
    pub crafter: Crafter,
    pub products: Vec<Product>,
}

/// Result of an admin approval action.
#[derive(Debug, Serialize, ToSchema)]
pub struct CrafterDecision {
    pub id: uuid::Uuid,
    pub name: String,
    pub verified: bool,
}
