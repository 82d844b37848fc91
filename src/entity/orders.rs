use sea_orm::entity::prelude::*;

use super::enums::{DeliveryMethod, OrderStatus, PaymentStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_email: String,
    pub customer_name: String,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
    pub delivery_method: DeliveryMethod,
    pub delivery_street: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_postcode: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_intent_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
