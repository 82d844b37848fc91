use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    clients::identity::SignedHeaders,
    dto::webhooks::WebhookAck,
    error::{AppError, AppResult},
    response::ApiResponse,
    services::webhook_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/identity", post(identity_webhook))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature headers".into()))
}

#[utoipa::path(
    post,
    path = "/api/webhooks/identity",
    request_body(content = String, description = "Signed identity-provider event", content_type = "application/json"),
    responses(
        (status = 200, description = "Event processed", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Missing headers or invalid signature"),
    ),
    tag = "Webhooks"
)]
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signed = SignedHeaders {
        id: header(&headers, "svix-id")?,
        timestamp: header(&headers, "svix-timestamp")?,
        signature: header(&headers, "svix-signature")?,
    };
    let resp = webhook_service::handle_identity_webhook(&state, signed, &body).await?;
    Ok(Json(resp))
}
