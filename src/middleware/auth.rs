use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::modules::admin::model::Admin;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::verify_token;

/// Extractor gating every admin-only operation. Validates the bearer token
/// and loads the admin it names (password column excluded), so handlers
/// receive the authenticated admin as an explicit argument rather than
/// reading it from ambient request state.
#[derive(Debug, Clone)]
pub struct AuthAdmin(pub Admin);

impl FromRequestParts<AppState> for AuthAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthenticated("Access denied. No token provided."))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthenticated("Access denied. No token provided."))?;

        let claims = verify_token(token, &state.jwt_config)?;

        let admin_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, email, role, last_login, created_at FROM admins WHERE id = $1",
        )
        .bind(admin_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::unauthenticated("Invalid token. Admin not found."))?;

        Ok(AuthAdmin(admin))
    }
}
