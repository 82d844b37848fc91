use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::enums::DeliveryMethod, models::DeliveryAddress};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeliveryRequest {
    pub method: Option<DeliveryMethod>,
    pub address: Option<DeliveryAddress>,
}

/// Every field is optional at the wire level so missing ones map to 400
/// with a readable message instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreatePaymentIntentRequest {
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
    pub delivery: Option<DeliveryRequest>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: Option<String>,
    pub order_id: Uuid,
    pub order_number: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
}
