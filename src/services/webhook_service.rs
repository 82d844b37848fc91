use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    clients::identity::{self, SignedHeaders},
    db::OrmConn,
    dto::webhooks::{IdentityEvent, IdentityUserData, WebhookAck},
    entity::{
        enums::UserRole,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn handle_identity_webhook(
    state: &AppState,
    headers: SignedHeaders<'_>,
    body: &[u8],
) -> AppResult<ApiResponse<WebhookAck>> {
    let secret = state
        .config
        .identity_webhook_secret
        .as_ref()
        .ok_or_else(|| AppError::ServiceUnavailable("Identity webhook is not configured".into()))?;

    identity::verify(secret.expose_secret(), &headers, body, Utc::now().timestamp()).map_err(
        |err| {
            warn!(error = %err, svix_id = headers.id, "rejected identity webhook");
            AppError::BadRequest("Invalid webhook signature".into())
        },
    )?;

    let event: IdentityEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    apply_event(&state.orm, &event).await?;

    Ok(ApiResponse::success(
        "Webhook processed",
        WebhookAck { event: event.kind },
        Some(Meta::empty()),
    ))
}

#[instrument(skip(db, event), fields(kind = %event.kind, identity_id = %event.data.id))]
pub async fn apply_event(db: &OrmConn, event: &IdentityEvent) -> AppResult<()> {
    match event.kind.as_str() {
        "user.created" | "user.updated" => upsert_user(db, &event.data).await,
        "user.deleted" => {
            let result = Users::delete_many()
                .filter(UserCol::IdentityId.eq(event.data.id.as_str()))
                .exec(db)
                .await?;
            info!(rows = result.rows_affected, "user deleted");
            Ok(())
        }
        other => {
            debug!(kind = other, "ignoring identity event");
            Ok(())
        }
    }
}

/// Role and onboarding flag only change when the event carries them.
async fn upsert_user(db: &OrmConn, data: &IdentityUserData) -> AppResult<()> {
    let existing = Users::find()
        .filter(UserCol::IdentityId.eq(data.id.as_str()))
        .one(db)
        .await?;

    match existing {
        Some(user) => {
            let mut active: UserActive = user.into();
            if let Some(email) = data.primary_email() {
                active.email = Set(email);
            }
            active.first_name = Set(data.first_name.clone());
            active.last_name = Set(data.last_name.clone());
            active.image_url = Set(data.image_url.clone());
            if let Some(role) = data.role() {
                active.role = Set(role);
            }
            if let Some(done) = data.unsafe_metadata.onboarding_complete {
                active.onboarding_complete = Set(done);
            }
            active.updated_at = Set(Utc::now().into());
            active.update(db).await?;
            info!("user updated");
        }
        None => {
            let email = data
                .primary_email()
                .ok_or_else(|| AppError::BadRequest("User has no email address".into()))?;
            UserActive {
                id: Set(Uuid::new_v4()),
                identity_id: Set(data.id.clone()),
                email: Set(email),
                first_name: Set(data.first_name.clone()),
                last_name: Set(data.last_name.clone()),
                image_url: Set(data.image_url.clone()),
                role: Set(data.role().unwrap_or(UserRole::Customer)),
                onboarding_complete: Set(data.unsafe_metadata.onboarding_complete.unwrap_or(false)),
                crafter_id: Set(None),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(db)
            .await?;
            info!("user created");
        }
    }
    Ok(())
}
