use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use secrecy::ExposeSecret;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    dto::auth::Claims,
    entity::{
        enums::UserRole,
        users::{self, Entity as Users},
    },
    error::{AppError, AppResult},
    state::AppState,
};

/// The caller behind a verified session token. `user` is `None` until the
/// identity webhook has synced the account locally.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity_id: String,
    pub user: Option<users::Model>,
}

impl AuthUser {
    pub fn role(&self) -> UserRole {
        self.user
            .as_ref()
            .map(|u| u.role)
            .unwrap_or(UserRole::Customer)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn local_user(&self) -> AppResult<&users::Model> {
        self.user.as_ref().ok_or_else(|| AppError::not_found("User"))
    }
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role() != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Admin)
}

pub fn decode_token(auth: &AuthConfig, token: &str) -> AppResult<Claims> {
    let (key, mut validation) = match auth {
        AuthConfig::RsaPem(pem) => (
            DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid public key: {e}")))?,
            Validation::new(Algorithm::RS256),
        ),
        AuthConfig::Secret(secret) => (
            DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            Validation::new(Algorithm::HS256),
        ),
    };
    validation.validate_aud = false;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?
            .to_str()
            .map_err(|_| AppError::Unauthorized)?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AppError::Unauthorized)?;

        let claims = decode_token(&state.config.auth, token)?;

        let user = Users::find()
            .filter(users::Column::IdentityId.eq(claims.sub.as_str()))
            .one(&state.orm)
            .await?;

        Ok(AuthUser {
            identity_id: claims.sub,
            user,
        })
    }
}
