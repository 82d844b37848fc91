use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    categories, crafters,
    enums::{DeliveryMethod, OrderStatus, PaymentStatus, ProductCategory, UserRole},
    order_items, orders, products, users,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub identity_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub role: UserRole,
    pub onboarding_complete: bool,
    pub crafter_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Crafter {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub location: String,
    pub bio: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub verified: bool,
    pub products_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The crafter fields embedded in product listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CrafterSummary {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub location: String,
}

/// Prices are integer minor units (pence).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub crafter_id: Uuid,
    pub crafter: Option<CrafterSummary>,
    pub category: ProductCategory,
    pub description: String,
    pub materials: String,
    pub dimensions: Option<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub icon: String,
    pub display_order: i32,
    pub is_active: bool,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub postcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_email: String,
    pub customer_name: String,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<DeliveryAddress>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: i64,
    pub crafter_id: Uuid,
    pub crafter_name: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            identity_id: model.identity_id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            image_url: model.image_url,
            role: model.role,
            onboarding_complete: model.onboarding_complete,
            crafter_id: model.crafter_id,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<crafters::Model> for Crafter {
    fn from(model: crafters::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            specialty: model.specialty,
            location: model.location,
            bio: model.bio,
            email: model.email,
            phone: model.phone,
            profile_image: model.profile_image,
            verified: model.verified,
            products_count: model.products_count,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<&crafters::Model> for CrafterSummary {
    fn from(model: &crafters::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            specialty: model.specialty.clone(),
            location: model.location.clone(),
        }
    }
}

impl Product {
    pub fn from_entity(model: products::Model, crafter: Option<&crafters::Model>) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            crafter_id: model.crafter_id,
            crafter: crafter.map(CrafterSummary::from),
            category: model.category,
            description: model.description,
            materials: model.materials,
            dimensions: model.dimensions,
            in_stock: model.in_stock,
            featured: model.featured,
            images: model.images,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl Category {
    pub fn from_entity(model: categories::Model, product_count: i64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            icon: model.icon,
            display_order: model.display_order,
            is_active: model.is_active,
            product_count,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        let delivery_address = match (
            model.delivery_street,
            model.delivery_city,
            model.delivery_postcode,
        ) {
            (Some(street), Some(city), Some(postcode)) => Some(DeliveryAddress {
                street,
                city,
                postcode,
            }),
            _ => None,
        };

        Self {
            id: model.id,
            order_number: model.order_number,
            customer_email: model.customer_email,
            customer_name: model.customer_name,
            subtotal: model.subtotal,
            delivery_fee: model.delivery_fee,
            total: model.total,
            delivery_method: model.delivery_method,
            delivery_address,
            status: model.status,
            payment_status: model.payment_status,
            payment_intent_id: model.payment_intent_id,
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            quantity: model.quantity,
            price: model.price,
            crafter_id: model.crafter_id,
            crafter_name: model.crafter_name,
        }
    }
}
