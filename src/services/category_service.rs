use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::categories::{CategoryList, CategoryWithProducts},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        crafters::{Column as CrafterCol, Entity as Crafters},
        enums::ProductCategory,
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    models::{Category, Product},
    response::{ApiResponse, Meta},
    services::product_service::visible_products,
    state::AppState,
};

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let categories = Categories::find()
        .filter(CategoryCol::IsActive.eq(true))
        .order_by_asc(CategoryCol::DisplayOrder)
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?;

    let counts: HashMap<String, i64> = Products::find()
        .select_only()
        .column(ProdCol::Category)
        .column_as(Expr::col((Products, ProdCol::Id)).count(), "count")
        .inner_join(Crafters)
        .filter(CrafterCol::Verified.eq(true))
        .group_by(ProdCol::Category)
        .into_tuple::<(String, i64)>()
        .all(&state.orm)
        .await?
        .into_iter()
        .collect();

    let items: Vec<Category> = categories
        .into_iter()
        .map(|c| {
            let count = counts.get(&c.name).copied().unwrap_or(0);
            Category::from_entity(c, count)
        })
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn get_category(
    state: &AppState,
    slug: &str,
) -> AppResult<ApiResponse<CategoryWithProducts>> {
    let category = Categories::find()
        .filter(CategoryCol::Slug.eq(slug))
        .filter(CategoryCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    // Categories without a matching product enum (e.g. "Leather Goods") list nothing.
    let products: Vec<Product> = match ProductCategory::from_name(&category.name) {
        Some(product_category) => visible_products()
            .filter(ProdCol::Category.eq(product_category))
            .order_by_desc(ProdCol::CreatedAt)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|(p, c)| Product::from_entity(p, c.as_ref()))
            .collect(),
        None => Vec::new(),
    };

    let count = products.len() as i64;
    Ok(ApiResponse::success(
        "Category",
        CategoryWithProducts {
            category: Category::from_entity(category, count),
            products,
        },
        None,
    ))
}
