use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::config::jwt::JwtConfig;
use crate::utils::errors::AppError;
use crate::utils::jwt::create_token;
use crate::utils::password::{hash_password, verify_password};

use super::model::{Admin, CreateAdminRequest, LoginRequest, LoginResponse};

const ADMIN_COLUMNS: &str = "id, email, role, last_login, created_at";

pub struct AdminService;

impl AdminService {
    /// Verifies credentials and issues a bearer token. Unknown email and
    /// wrong password both fail with the same generic error.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct AdminWithPassword {
            id: Uuid,
            password: String,
        }

        let email = normalize_email(&dto.email);

        let candidate = sqlx::query_as::<_, AdminWithPassword>(
            "SELECT id, password FROM admins WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&dto.password, &candidate.password)? {
            return Err(AppError::InvalidCredentials);
        }

        let admin = sqlx::query_as::<_, Admin>(&format!(
            "UPDATE admins SET last_login = NOW() WHERE id = $1 RETURNING {}",
            ADMIN_COLUMNS
        ))
        .bind(candidate.id)
        .fetch_one(db)
        .await?;

        let token = create_token(admin.id, jwt_config)?;

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            admin,
        })
    }

    /// Re-hashes and persists a new password after checking the current one.
    /// The length check on the new password happens in the DTO validator,
    /// before this function runs.
    #[instrument(skip(db, current_password, new_password))]
    pub async fn change_password(
        db: &PgPool,
        admin_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let stored_hash = sqlx::query_scalar::<_, String>(
            "SELECT password FROM admins WHERE id = $1",
        )
        .bind(admin_id)
        .fetch_one(db)
        .await?;

        if !verify_password(current_password, &stored_hash)? {
            return Err(AppError::validation("Current password is incorrect"));
        }

        let new_hash = hash_password(new_password)?;

        sqlx::query("UPDATE admins SET password = $1 WHERE id = $2")
            .bind(&new_hash)
            .bind(admin_id)
            .execute(db)
            .await?;

        Ok(())
    }

    /// Bootstrap admin creation. The route is deliberately unauthenticated
    /// for first-time setup; see DESIGN.md for the recorded risk.
    #[instrument(skip(db, dto))]
    pub async fn create_admin(db: &PgPool, dto: CreateAdminRequest) -> Result<Admin, AppError> {
        let email = normalize_email(&dto.email);

        let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM admins WHERE email = $1")
            .bind(&email)
            .fetch_optional(db)
            .await?;

        if existing.is_some() {
            return Err(AppError::already_exists(
                "Admin with this email already exists",
            ));
        }

        let hashed_password = hash_password(&dto.password)?;

        let admin = sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO admins (email, password) VALUES ($1, $2) RETURNING {}",
            ADMIN_COLUMNS
        ))
        .bind(&email)
        .bind(&hashed_password)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::already_exists("Admin with this email already exists");
                }
            }
            AppError::from(e)
        })?;

        Ok(admin)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
