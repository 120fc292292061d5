use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{Claims, LoginRequest, RegisterRequest, TokenResponse, UserDetailsResponse},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{User, UserProfile},
    response::ApiResponse,
};

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let RegisterRequest {
        name,
        email,
        password,
    } = payload;

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("User already Registered".to_string()));
    }

    validate_credentials(&email, &password)?;

    let password_hash = hash_password(&password)?;
    let id = Uuid::new_v4();

    let user: User = sqlx::query_as(
        "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(name.as_str())
    .bind(email.as_str())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    let token = create_token(&user)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_register",
        serde_json::json!({ "user_id": user.id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(TokenResponse { token }))
}

pub async fn login_user(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.as_str())
        .fetch_optional(pool)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("User does not exist".to_string())),
    };

    verify_password(&user, &payload.password)?;

    let token = create_token(&user)?;

    if let Err(err) = log_audit(
        pool,
        Some(user.id),
        "user_login",
        serde_json::json!({ "user_id": user.id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(TokenResponse { token }))
}

/// Admin sign-in against the database role column. Bootstrap credentials are
/// seeded once by `bin/seed`, not checked here.
pub async fn admin_login(
    pool: &DbPool,
    payload: LoginRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    let admin: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE email = $1 AND role = 'admin'")
            .bind(payload.email.as_str())
            .fetch_optional(pool)
            .await?;
    let admin = match admin {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid admin credentials".to_string())),
    };

    if verify_password(&admin, &payload.password).is_err() {
        return Err(AppError::BadRequest("Invalid admin credentials".to_string()));
    }

    let token = create_token(&admin)?;

    if let Err(err) = log_audit(
        pool,
        Some(admin.id),
        "admin_login",
        serde_json::json!({ "user_id": admin.id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::ok(TokenResponse { token }))
}

pub async fn create_admin(
    pool: &DbPool,
    caller: &AuthUser,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<TokenResponse>> {
    ensure_admin(caller)?;

    let exist: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 AND role = 'admin'")
            .bind(payload.email.as_str())
            .fetch_optional(pool)
            .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest(
            "Admin already exists with this email".to_string(),
        ));
    }

    validate_credentials(&payload.email, &payload.password)?;

    let password_hash = hash_password(&payload.password)?;

    let admin: User = sqlx::query_as(
        "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, 'admin') RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(payload.name.as_str())
    .bind(payload.email.as_str())
    .bind(password_hash)
    .fetch_one(pool)
    .await?;

    let token = create_token(&admin)?;

    if let Err(err) = log_audit(
        pool,
        Some(caller.user_id),
        "admin_create",
        serde_json::json!({ "admin_id": admin.id }),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::with_message(
        "Admin created successfully",
        TokenResponse { token },
    ))
}

pub async fn user_details(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<UserDetailsResponse>> {
    let record: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(pool)
        .await?;
    let record = match record {
        Some(u) => u,
        None => return Err(AppError::NotFound("User not found".to_string())),
    };

    Ok(ApiResponse::ok(UserDetailsResponse {
        user: UserProfile {
            name: record.name,
            email: record.email,
        },
    }))
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    // Shape check only; deliverability is the mail provider's problem.
    let valid_email = email.contains('@') && email.rsplit('@').next().is_some_and(|d| d.contains('.'));
    if !valid_email {
        return Err(AppError::BadRequest("Please enter a valid email".to_string()));
    }
    if password.chars().count() < 8 {
        return Err(AppError::BadRequest(
            "Password must be 8 characters or more".to_string(),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

fn verify_password(user: &User, password: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::BadRequest("Invalid Credentials".to_string()))
}

fn create_token(user: &User) -> Result<String, AppError> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(format!("Bearer {}", token))
}
