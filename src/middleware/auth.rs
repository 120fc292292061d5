use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: String,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role != "admin" {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn unauthorized(message: &str, code: &'static str) -> AppError {
    AppError::Unauthorized {
        message: message.to_string(),
        code,
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| unauthorized("Authentication required. Please log in.", "AUTH_REQUIRED"))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| unauthorized("Invalid Authorization header", "INVALID_TOKEN"))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Invalid Authorization scheme", "INVALID_TOKEN"))?
            .trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => unauthorized("Token expired", "TOKEN_EXPIRED"),
            _ => unauthorized("Invalid token", "INVALID_TOKEN"),
        })?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| unauthorized("Invalid token format", "INVALID_TOKEN_FORMAT"))?;

        Ok(AuthUser {
            user_id,
            role: decoded.claims.role.clone(),
        })
    }
}
