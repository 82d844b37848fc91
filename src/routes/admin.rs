use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        crafters::{CrafterDecision, CrafterList},
        embeddings::{EmbeddingRun, EmbeddingStatus},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{admin_service, embedding_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crafters/pending", get(list_pending_crafters))
        .route("/crafters/{id}/approve", post(approve_crafter))
        .route("/crafters/{id}/reject", post(reject_crafter))
        .route("/embeddings/generate", post(generate_embeddings))
        .route("/embeddings/status", get(embedding_status))
}

#[utoipa::path(
    get,
    path = "/api/admin/crafters/pending",
    responses(
        (status = 200, description = "Unverified crafters, newest first", body = ApiResponse<CrafterList>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_pending_crafters(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CrafterList>>> {
    let resp = admin_service::list_pending_crafters(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/crafters/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Crafter ID")
    ),
    responses(
        (status = 200, description = "Crafter approved", body = ApiResponse<CrafterDecision>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Crafter not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_crafter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CrafterDecision>>> {
    let resp = admin_service::approve_crafter(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/crafters/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Crafter ID")
    ),
    responses(
        (status = 200, description = "Crafter rejected and deleted", body = ApiResponse<CrafterDecision>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Crafter not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_crafter(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CrafterDecision>>> {
    let resp = admin_service::reject_crafter(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/embeddings/generate",
    responses(
        (status = 200, description = "Embeddings generated for products missing one", body = ApiResponse<EmbeddingRun>),
        (status = 403, description = "Forbidden"),
        (status = 503, description = "Embedding API not configured"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn generate_embeddings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<EmbeddingRun>>> {
    let resp = embedding_service::generate(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/embeddings/status",
    responses(
        (status = 200, description = "Embedding coverage", body = ApiResponse<EmbeddingStatus>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn embedding_status(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<EmbeddingStatus>>> {
    let resp = embedding_service::status(&state, &user).await?;
    Ok(Json(resp))
}
