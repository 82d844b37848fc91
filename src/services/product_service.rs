use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, SelectTwo, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        crafters::{Column as CrafterCol, Entity as Crafters},
        enums::UserRole,
        product_embeddings::{Column as EmbeddingCol, Entity as ProductEmbeddings},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Products whose crafter is verified, paired with that crafter.
pub fn visible_products() -> SelectTwo<Products, Crafters> {
    Products::find()
        .find_also_related(Crafters)
        .filter(CrafterCol::Verified.eq(true))
}

fn visible_products_only() -> Select<Products> {
    Products::find()
        .inner_join(Crafters)
        .filter(CrafterCol::Verified.eq(true))
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category) = query.category {
        condition = condition.add(Column::Category.eq(category));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::Featured.eq(featured));
    }

    if let Some(crafter_id) = query.crafter_id {
        condition = condition.add(Column::CrafterId.eq(crafter_id));
    }

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col((Products, Column::Name)).ilike(pattern.clone()))
                .add(Expr::col((Products, Column::Description)).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let total = visible_products_only()
        .filter(condition.clone())
        .count(&state.orm)
        .await? as i64;

    let mut finder = visible_products().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, crafter)| Product::from_entity(product, crafter.as_ref()))
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let (product, crafter) = visible_products()
        .filter(Column::Id.eq(id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(ApiResponse::success(
        "Product",
        Product::from_entity(product, crafter.as_ref()),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let local = user.local_user()?;
    let crafter_id = local.crafter_id.ok_or(AppError::Forbidden)?;
    let crafter = Crafters::find_by_id(crafter_id)
        .one(&state.orm)
        .await?
        .filter(|c| c.verified)
        .ok_or(AppError::Forbidden)?;

    let name = payload.name.trim().to_string();
    let description = payload.description.trim().to_string();
    let materials = payload.materials.trim().to_string();
    validate_product(&name, payload.price, &description, &materials)?;

    let txn = state.orm.begin().await?;
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        crafter_id: Set(crafter.id),
        name: Set(name),
        price: Set(payload.price),
        category: Set(payload.category),
        description: Set(description),
        materials: Set(materials),
        dimensions: Set(payload.dimensions),
        in_stock: Set(payload.in_stock.unwrap_or(true)),
        featured: Set(payload.featured.unwrap_or(false)),
        images: Set(payload.images),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&txn).await?;

    Crafters::update_many()
        .col_expr(
            CrafterCol::ProductsCount,
            Expr::col(CrafterCol::ProductsCount).add(1),
        )
        .filter(CrafterCol::Id.eq(crafter.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(local.id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from_entity(product, Some(&crafter)),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    ensure_owner_or_admin(user, &existing)?;

    let text_changed = payload.name.is_some()
        || payload.description.is_some()
        || payload.materials.is_some()
        || payload.category.is_some();

    let name = payload.name.map(|n| n.trim().to_string()).unwrap_or_else(|| existing.name.clone());
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or_else(|| existing.description.clone());
    let materials = payload
        .materials
        .map(|m| m.trim().to_string())
        .unwrap_or_else(|| existing.materials.clone());
    let price = payload.price.unwrap_or(existing.price);
    validate_product(&name, price, &description, &materials)?;

    let txn = state.orm.begin().await?;
    let mut active: ActiveModel = existing.into();
    active.name = Set(name);
    active.description = Set(description);
    active.materials = Set(materials);
    active.price = Set(price);
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(dimensions) = payload.dimensions {
        active.dimensions = Set(Some(dimensions));
    }
    if let Some(in_stock) = payload.in_stock {
        active.in_stock = Set(in_stock);
    }
    if let Some(featured) = payload.featured {
        active.featured = Set(featured);
    }
    if let Some(images) = payload.images {
        active.images = Set(images);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;

    if text_changed {
        ProductEmbeddings::delete_many()
            .filter(EmbeddingCol::ProductId.eq(product.id))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id(),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let crafter = product.find_related(Crafters).one(&state.orm).await?;
    Ok(ApiResponse::success(
        "Updated",
        Product::from_entity(product, crafter.as_ref()),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;
    ensure_owner_or_admin(user, &existing)?;

    let txn = state.orm.begin().await?;
    let result = Products::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product"));
    }
    Crafters::update_many()
        .col_expr(
            CrafterCol::ProductsCount,
            Expr::cust("GREATEST(products_count - 1, 0)"),
        )
        .filter(CrafterCol::Id.eq(existing.crafter_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id(),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn ensure_owner_or_admin(user: &AuthUser, product: &ProductModel) -> AppResult<()> {
    if user.role() == UserRole::Admin {
        return Ok(());
    }
    let owns = user
        .user
        .as_ref()
        .and_then(|u| u.crafter_id)
        .is_some_and(|crafter_id| crafter_id == product.crafter_id);
    if owns { Ok(()) } else { Err(AppError::Forbidden) }
}

pub fn validate_product(
    name: &str,
    price: i64,
    description: &str,
    materials: &str,
) -> AppResult<()> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Product name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    if price < 0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }
    if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::BadRequest(format!(
            "Description must be 1-{MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if materials.is_empty() {
        return Err(AppError::BadRequest("Materials are required".into()));
    }
    Ok(())
}
