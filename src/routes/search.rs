use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::search::{SemanticSearchRequest, SemanticSearchResults},
    error::AppResult,
    response::ApiResponse,
    services::search_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/semantic", post(semantic_search))
}

#[utoipa::path(
    post,
    path = "/api/search/semantic",
    request_body = SemanticSearchRequest,
    responses(
        (status = 200, description = "Products ranked by similarity", body = ApiResponse<SemanticSearchResults>),
        (status = 400, description = "Missing query"),
        (status = 503, description = "Embedding API not configured"),
    ),
    tag = "Search"
)]
pub async fn semantic_search(
    State(state): State<AppState>,
    Json(payload): Json<SemanticSearchRequest>,
) -> AppResult<Json<ApiResponse<SemanticSearchResults>>> {
    let resp = search_service::semantic_search(&state, payload).await?;
    Ok(Json(resp))
}
