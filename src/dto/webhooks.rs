use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::enums::UserRole;

/// A user lifecycle event delivered by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: IdentityUserData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUserData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub public_metadata: UserMetadata,
    #[serde(default)]
    pub unsafe_metadata: UserMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddress {
    pub email_address: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub role: Option<String>,
    #[serde(rename = "onboardingComplete")]
    pub onboarding_complete: Option<bool>,
}

impl IdentityUserData {
    pub fn primary_email(&self) -> Option<String> {
        self.email_addresses
            .first()
            .map(|e| e.email_address.trim().to_lowercase())
    }

    /// Role carried by the event. `public_metadata` is only writable from the
    /// provider's backend and may grant any role; `unsafe_metadata` is
    /// user-writable and can only select `customer` or `crafter`. Unknown role
    /// names are ignored rather than rejected.
    pub fn role(&self) -> Option<UserRole> {
        let public = self.public_metadata.role.as_deref().and_then(parse_role);
        let self_selected = self
            .unsafe_metadata
            .role
            .as_deref()
            .and_then(parse_role)
            .filter(|role| *role != UserRole::Admin);
        public.or(self_selected)
    }
}

fn parse_role(name: &str) -> Option<UserRole> {
    match name {
        "customer" => Some(UserRole::Customer),
        "crafter" => Some(UserRole::Crafter),
        "admin" => Some(UserRole::Admin),
        _ => None,
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub event: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_created_event() {
        let event: IdentityEvent = serde_json::from_str(
            r#"{
                "type": "user.created",
                "data": {
                    "id": "user_1",
                    "email_addresses": [{"email_address": "Ann@Example.com"}],
                    "first_name": "Ann",
                    "last_name": null,
                    "image_url": "https://img/1",
                    "unsafe_metadata": {"role": "crafter", "onboardingComplete": true}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(event.kind, "user.created");
        assert_eq!(event.data.primary_email().as_deref(), Some("ann@example.com"));
        assert_eq!(event.data.role(), Some(UserRole::Crafter));
        assert_eq!(event.data.unsafe_metadata.onboarding_complete, Some(true));
    }

    #[test]
    fn parses_deleted_event_without_profile_fields() {
        let event: IdentityEvent =
            serde_json::from_str(r#"{"type":"user.deleted","data":{"id":"user_1","deleted":true}}"#)
                .unwrap();
        assert_eq!(event.data.id, "user_1");
        assert!(event.data.primary_email().is_none());
        assert!(event.data.role().is_none());
    }

    #[test]
    fn admin_is_only_granted_through_public_metadata() {
        let event: IdentityEvent = serde_json::from_str(
            r#"{"type":"user.updated","data":{"id":"u","unsafe_metadata":{"role":"admin"}}}"#,
        )
        .unwrap();
        assert!(event.data.role().is_none());

        let event: IdentityEvent = serde_json::from_str(
            r#"{"type":"user.updated","data":{"id":"u","public_metadata":{"role":"admin"},"unsafe_metadata":{"role":"crafter"}}}"#,
        )
        .unwrap();
        assert_eq!(event.data.role(), Some(UserRole::Admin));
    }

    #[test]
    fn ignores_unknown_roles() {
        let event: IdentityEvent = serde_json::from_str(
            r#"{"type":"user.updated","data":{"id":"u","unsafe_metadata":{"role":"superuser"}}}"#,
        )
        .unwrap();
        assert!(event.data.role().is_none());
    }
}
