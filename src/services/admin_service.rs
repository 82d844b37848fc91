use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    audit,
    dto::crafters::{CrafterDecision, CrafterList},
    entity::{
        crafters::{ActiveModel as CrafterActive, Column as CrafterCol, Entity as Crafters},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Crafter,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_pending_crafters(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CrafterList>> {
    ensure_admin(user)?;

    let items: Vec<Crafter> = Crafters::find()
        .filter(CrafterCol::Verified.eq(false))
        .order_by_desc(CrafterCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Crafter::from)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Pending crafters", CrafterList { items }, Some(meta)))
}

pub async fn approve_crafter(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CrafterDecision>> {
    ensure_admin(user)?;

    let existing = Crafters::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Crafter"))?;

    let mut active: CrafterActive = existing.into();
    active.verified = Set(true);
    active.updated_at = Set(Utc::now().into());
    let crafter = active.update(&state.orm).await?;

    info!(crafter_id = %crafter.id, "crafter approved");
    audit::record(
        &state.pool,
        user.user_id(),
        "crafter_approve",
        "crafters",
        serde_json::json!({ "crafter_id": crafter.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Crafter approved",
        CrafterDecision {
            id: crafter.id,
            name: crafter.name,
            verified: crafter.verified,
        },
        Some(Meta::empty()),
    ))
}

/// Deletes the crafter and unlinks its owner in one transaction.
pub async fn reject_crafter(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CrafterDecision>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let crafter = Crafters::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Crafter"))?;

    Users::update_many()
        .col_expr(UserCol::CrafterId, Expr::value(Option::<Uuid>::None))
        .col_expr(UserCol::UpdatedAt, Expr::cust("NOW()"))
        .filter(UserCol::CrafterId.eq(id))
        .exec(&txn)
        .await?;
    Crafters::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    info!(crafter_id = %id, "crafter rejected");
    audit::record(
        &state.pool,
        user.user_id(),
        "crafter_reject",
        "crafters",
        serde_json::json!({ "crafter_id": id, "name": crafter.name }),
    )
    .await;

    Ok(ApiResponse::success(
        "Crafter rejected",
        CrafterDecision {
            id,
            name: crafter.name,
            verified: false,
        },
        Some(Meta::empty()),
    ))
}
