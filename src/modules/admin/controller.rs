use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;
use utoipa::ToSchema;

use crate::middleware::auth::AuthAdmin;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{
    AdminCreatedResponse, ChangePasswordRequest, CreateAdminRequest, LoginRequest, LoginResponse,
    MessageResponse, ProfileResponse,
};
use super::service::AdminService;

#[derive(ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Login and receive a bearer token
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 400, description = "Bad request - validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AdminService::login(&state.db, dto, &state.jwt_config).await?;
    Ok(Json(response))
}

/// Create an admin account (bootstrap route, unauthenticated)
#[utoipa::path(
    post,
    path = "/api/admin/create",
    request_body = CreateAdminRequest,
    responses(
        (status = 201, description = "Admin created successfully", body = AdminCreatedResponse),
        (status = 400, description = "Validation error or email already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Admin"
)]
#[instrument(skip(state, dto))]
pub async fn create_admin(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminCreatedResponse>), AppError> {
    let admin = AdminService::create_admin(&state.db, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(AdminCreatedResponse {
            message: "Admin created successfully".to_string(),
            admin,
        }),
    ))
}

/// Get the authenticated admin's profile
#[utoipa::path(
    get,
    path = "/api/admin/profile",
    responses(
        (status = 200, description = "Admin profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
#[instrument(skip(admin))]
pub async fn get_profile(AuthAdmin(admin): AuthAdmin) -> Json<ProfileResponse> {
    // Pure projection; authentication already loaded the record.
    Json(ProfileResponse { admin })
}

/// Change the authenticated admin's password
#[utoipa::path(
    put,
    path = "/api/admin/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, description = "Wrong current password or new password too short", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
#[instrument(skip(state, admin, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthAdmin(admin): AuthAdmin,
    ValidatedJson(dto): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AdminService::change_password(&state.db, admin.id, &dto.current_password, &dto.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
