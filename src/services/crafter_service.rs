use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    audit,
    dto::crafters::{CrafterList, CrafterSetupRequest, CrafterWithProducts},
    entity::{
        crafters::{ActiveModel as CrafterActive, Column as CrafterCol, Entity as Crafters},
        products::{Column as ProdCol, Entity as Products},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Crafter, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_crafters(state: &AppState) -> AppResult<ApiResponse<CrafterList>> {
    let items: Vec<Crafter> = Crafters::find()
        .filter(CrafterCol::Verified.eq(true))
        .order_by_asc(CrafterCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Crafter::from)
        .collect();

    let meta = Meta::count(items.len());
    Ok(ApiResponse::success("Crafters", CrafterList { items }, Some(meta)))
}

pub async fn get_crafter(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<CrafterWithProducts>> {
    let crafter = Crafters::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|c| c.verified)
        .ok_or_else(|| AppError::not_found("Crafter"))?;

    let products = Products::find()
        .filter(ProdCol::CrafterId.eq(crafter.id))
        .order_by_desc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| Product::from_entity(p, Some(&crafter)))
        .collect();

    Ok(ApiResponse::success(
        "Crafter",
        CrafterWithProducts {
            crafter: Crafter::from(crafter),
            products,
        },
        None,
    ))
}

pub async fn my_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Crafter>> {
    let crafter_id = user
        .local_user()?
        .crafter_id
        .ok_or_else(|| AppError::not_found("Crafter profile"))?;
    let crafter = Crafters::find_by_id(crafter_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Crafter profile"))?;
    Ok(ApiResponse::success("Crafter profile", Crafter::from(crafter), None))
}

/// Creates an unverified crafter profile and links it to the caller.
pub async fn setup_profile(
    state: &AppState,
    user: &AuthUser,
    payload: CrafterSetupRequest,
) -> AppResult<ApiResponse<Crafter>> {
    let user_id = user.local_user()?.id;
    let fields = SetupFields::parse(payload)?;

    let txn = state.orm.begin().await?;
    let local = Users::find_by_id(user_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    if local.crafter_id.is_some() {
        return Err(AppError::BadRequest("Crafter profile already exists".into()));
    }

    let crafter = CrafterActive {
        id: Set(Uuid::new_v4()),
        name: Set(fields.name),
        specialty: Set(fields.specialty),
        location: Set(fields.location),
        bio: Set(fields.bio),
        email: Set(Some(local.email.clone())),
        phone: Set(fields.phone),
        profile_image: Set(local.image_url.clone()),
        verified: Set(false),
        products_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut active: UserActive = local.into();
    active.crafter_id = Set(Some(crafter.id));
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(&txn).await?;
    txn.commit().await?;

    info!(crafter_id = %crafter.id, "crafter profile submitted for approval");
    audit::record(
        &state.pool,
        Some(user_id),
        "crafter_setup",
        "crafters",
        serde_json::json!({ "crafter_id": crafter.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Crafter profile created",
        Crafter::from(crafter),
        Some(Meta::empty()),
    ))
}

#[derive(Debug)]
struct SetupFields {
    name: String,
    bio: String,
    specialty: String,
    location: String,
    phone: Option<String>,
}

impl SetupFields {
    fn parse(payload: CrafterSetupRequest) -> AppResult<Self> {
        Ok(Self {
            name: bounded("Business name", &payload.business_name, 100)?,
            bio: bounded("Bio", &payload.bio, 1000)?,
            specialty: bounded("Specialty", &payload.specialty, 200)?,
            location: bounded("Location", &payload.location, 100)?,
            phone: payload
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
        })
    }
}

fn bounded(field: &str, value: &str, max: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CrafterSetupRequest {
        CrafterSetupRequest {
            business_name: "  Marsh Pottery ".into(),
            bio: "Wheel-thrown stoneware".into(),
            specialty: "Pottery".into(),
            phone: Some(" ".into()),
            location: "Dymchurch".into(),
        }
    }

    #[test]
    fn setup_fields_are_trimmed() {
        let fields = SetupFields::parse(request()).unwrap();
        assert_eq!(fields.name, "Marsh Pottery");
        assert!(fields.phone.is_none());
    }

    #[test]
    fn setup_rejects_blank_and_oversized_fields() {
        let mut payload = request();
        payload.bio = "   ".into();
        assert!(matches!(
            SetupFields::parse(payload),
            Err(AppError::BadRequest(msg)) if msg == "Bio is required"
        ));

        let mut payload = request();
        payload.location = "x".repeat(101);
        assert!(SetupFields::parse(payload).is_err());
    }
}
