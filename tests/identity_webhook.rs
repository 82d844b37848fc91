mod common;

use chrono::Utc;
use crafters_market::{
    clients::identity::{self, SignedHeaders},
    entity::{
        enums::UserRole,
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::AppError,
    services::webhook_service,
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use common::{WEBHOOK_SECRET, unique};

fn event(kind: &str, identity_id: &str, email: &str, metadata: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "type": kind,
        "data": {
            "id": identity_id,
            "email_addresses": [{ "email_address": email }],
            "first_name": "Rosa",
            "last_name": "Marsh",
            "image_url": null,
            "unsafe_metadata": metadata,
        }
    }))
    .unwrap()
}

async fn deliver(state: &AppState, body: &[u8]) -> Result<String, AppError> {
    let timestamp = Utc::now().timestamp().to_string();
    let id = unique("msg");
    let unsigned = SignedHeaders {
        id: &id,
        timestamp: &timestamp,
        signature: "",
    };
    let signature = identity::sign(WEBHOOK_SECRET, &unsigned, body).unwrap();
    let headers = SignedHeaders {
        signature: &signature,
        ..unsigned
    };
    let resp = webhook_service::handle_identity_webhook(state, headers, body).await?;
    Ok(resp.data.unwrap().event)
}

async fn find_user(state: &AppState, identity_id: &str) -> anyhow::Result<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::IdentityId.eq(identity_id))
        .one(&state.orm)
        .await?)
}

#[tokio::test]
async fn user_lifecycle_is_synced() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;
    let identity_id = unique("user");
    let email = format!("{identity_id}@Example.com");

    let created = event(
        "user.created",
        &identity_id,
        &email,
        serde_json::json!({ "onboardingComplete": false }),
    );
    assert_eq!(deliver(state, &created).await?, "user.created");
    let user = find_user(state, &identity_id).await?.unwrap();
    assert_eq!(user.email, email.to_lowercase());
    assert_eq!(user.role, UserRole::Customer);
    assert!(!user.onboarding_complete);

    let updated = event(
        "user.updated",
        &identity_id,
        &email,
        serde_json::json!({ "role": "crafter", "onboardingComplete": true }),
    );
    deliver(state, &updated).await?;
    let user = find_user(state, &identity_id).await?.unwrap();
    assert_eq!(user.role, UserRole::Crafter);
    assert!(user.onboarding_complete);

    // An update without metadata leaves role and onboarding alone.
    let renamed = event("user.updated", &identity_id, &email, serde_json::json!({}));
    deliver(state, &renamed).await?;
    let user = find_user(state, &identity_id).await?.unwrap();
    assert_eq!(user.role, UserRole::Crafter);
    assert!(user.onboarding_complete);

    let deleted = serde_json::to_vec(&serde_json::json!({
        "type": "user.deleted",
        "data": { "id": identity_id, "deleted": true }
    }))?;
    deliver(state, &deleted).await?;
    assert!(find_user(state, &identity_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn tampered_delivery_is_rejected() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let identity_id = unique("user");
    let body = event(
        "user.created",
        &identity_id,
        "tamper@example.com",
        serde_json::json!({}),
    );
    let timestamp = Utc::now().timestamp().to_string();
    let headers = SignedHeaders {
        id: "msg_tampered",
        timestamp: &timestamp,
        signature: "v1,bm90LWEtc2lnbmF0dXJl",
    };

    let err = webhook_service::handle_identity_webhook(&ctx.state, headers, &body)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid webhook signature"));
    assert!(find_user(&ctx.state, &identity_id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_events_are_acknowledged() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let body = serde_json::to_vec(&serde_json::json!({
        "type": "session.created",
        "data": { "id": unique("sess") }
    }))?;
    assert_eq!(deliver(&ctx.state, &body).await?, "session.created");
    Ok(())
}

#[tokio::test]
async fn self_selected_admin_role_is_ignored() -> anyhow::Result<()> {
    let Some(ctx) = common::setup().await? else {
        return Ok(());
    };
    let state = &ctx.state;
    let identity_id = unique("user");
    let email = format!("{identity_id}@example.com");

    let created = event(
        "user.created",
        &identity_id,
        &email,
        serde_json::json!({ "role": "admin" }),
    );
    deliver(state, &created).await?;
    let user = find_user(state, &identity_id).await?.unwrap();
    assert_eq!(user.role, UserRole::Customer);

    let promoted = serde_json::to_vec(&serde_json::json!({
        "type": "user.updated",
        "data": {
            "id": identity_id,
            "email_addresses": [{ "email_address": email }],
            "public_metadata": { "role": "admin" },
            "unsafe_metadata": {}
        }
    }))?;
    deliver(state, &promoted).await?;
    let user = find_user(state, &identity_id).await?.unwrap();
    assert_eq!(user.role, UserRole::Admin);
    Ok(())
}
