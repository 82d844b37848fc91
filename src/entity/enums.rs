use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "crafter")]
    Crafter,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// Closed set of product categories. Stored by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ProductCategory {
    #[sea_orm(string_value = "Jewelry")]
    Jewelry,
    #[sea_orm(string_value = "Pottery")]
    Pottery,
    #[sea_orm(string_value = "Textiles")]
    Textiles,
    #[sea_orm(string_value = "Woodwork")]
    Woodwork,
    #[sea_orm(string_value = "Art")]
    Art,
    #[sea_orm(string_value = "Other")]
    Other,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Jewelry => "Jewelry",
            ProductCategory::Pottery => "Pottery",
            ProductCategory::Textiles => "Textiles",
            ProductCategory::Woodwork => "Woodwork",
            ProductCategory::Art => "Art",
            ProductCategory::Other => "Other",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        ProductCategory::iter().find(|c| c.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[sea_orm(string_value = "pickup")]
    Pickup,
    #[sea_orm(string_value = "delivery")]
    Delivery,
    #[sea_orm(string_value = "shipping")]
    Shipping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_lookup_ignores_case_and_whitespace() {
        assert_eq!(ProductCategory::from_name(" pottery "), Some(ProductCategory::Pottery));
        assert_eq!(ProductCategory::from_name("ART"), Some(ProductCategory::Art));
        assert_eq!(ProductCategory::from_name("Leather Goods"), None);
    }

    #[test]
    fn every_category_resolves_from_its_name() {
        for category in ProductCategory::iter() {
            assert_eq!(ProductCategory::from_name(category.as_str()), Some(category));
        }
    }

    #[test]
    fn enums_serialize_to_stored_values() {
        assert_eq!(serde_json::to_value(DeliveryMethod::Shipping).unwrap(), "shipping");
        assert_eq!(serde_json::to_value(PaymentStatus::Paid).unwrap(), "paid");
        assert_eq!(serde_json::to_value(ProductCategory::Woodwork).unwrap(), "Woodwork");
    }
}
