use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::crafters::{CrafterList, CrafterSetupRequest, CrafterWithProducts},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Crafter,
    response::ApiResponse,
    services::crafter_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_crafters))
        .route("/setup", post(setup_profile))
        .route("/me", get(my_profile))
        .route("/{id}", get(get_crafter))
}

#[utoipa::path(
    get,
    path = "/api/crafters",
    responses(
        (status = 200, description = "Verified crafters sorted by name", body = ApiResponse<CrafterList>)
    ),
    tag = "Crafters"
)]
pub async fn list_crafters(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CrafterList>>> {
    let resp = crafter_service::list_crafters(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/crafters/{id}",
    params(
        ("id" = Uuid, Path, description = "Crafter ID")
    ),
    responses(
        (status = 200, description = "Crafter with products", body = ApiResponse<CrafterWithProducts>),
        (status = 404, description = "Crafter not found or not verified"),
    ),
    tag = "Crafters"
)]
pub async fn get_crafter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CrafterWithProducts>>> {
    let resp = crafter_service::get_crafter(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/crafters/setup",
    request_body = CrafterSetupRequest,
    responses(
        (status = 201, description = "Profile submitted for approval", body = ApiResponse<Crafter>),
        (status = 400, description = "Invalid input or profile already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not synced yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "Crafters"
)]
pub async fn setup_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CrafterSetupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Crafter>>)> {
    let resp = crafter_service::setup_profile(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/crafters/me",
    responses(
        (status = 200, description = "Caller's crafter profile", body = ApiResponse<Crafter>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No crafter profile"),
    ),
    security(("bearer_auth" = [])),
    tag = "Crafters"
)]
pub async fn my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Crafter>>> {
    let resp = crafter_service::my_profile(&state, &user).await?;
    Ok(Json(resp))
}
