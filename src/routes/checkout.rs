use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CreatePaymentIntentRequest, PaymentIntentResponse},
    error::AppResult,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/payment-intent", post(create_payment_intent))
}

#[utoipa::path(
    post,
    path = "/api/checkout/payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Payment intent for a new or reused pending order", body = ApiResponse<PaymentIntentResponse>),
        (status = 400, description = "Missing fields or product out of stock"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal Server Error"),
    ),
    tag = "Checkout"
)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentIntentRequest>,
) -> AppResult<Json<ApiResponse<PaymentIntentResponse>>> {
    let resp = checkout_service::create_payment_intent(&state, payload).await?;
    Ok(Json(resp))
}
