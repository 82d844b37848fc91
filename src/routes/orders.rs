use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{ConfirmationQuery, OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/{id}/confirmation", get(confirm_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Orders placed with the caller's email", body = ApiResponse<OrderList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_my_orders(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/confirmation",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("payment_intent" = Option<String>, Query, description = "Payment intent id from the redirect"),
        ("redirect_status" = Option<String>, Query, description = "Redirect status from the payment page"),
    ),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Payment not successful"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn confirm_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ConfirmationQuery>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::confirm_order(&state, id, query).await?;
    Ok(Json(resp))
}
