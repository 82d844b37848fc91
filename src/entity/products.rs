use sea_orm::entity::prelude::*;

use super::enums::ProductCategory;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub crafter_id: Uuid,
    pub name: String,
    pub price: i64,
    pub category: ProductCategory,
    pub description: String,
    pub materials: String,
    pub dimensions: Option<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub images: Vec<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::crafters::Entity",
        from = "Column::CrafterId",
        to = "super::crafters::Column::Id",
        on_delete = "Cascade"
    )]
    Crafters,
    #[sea_orm(has_one = "super::product_embeddings::Entity")]
    ProductEmbeddings,
}

impl Related<super::crafters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Crafters.def()
    }
}

impl Related<super::product_embeddings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductEmbeddings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
