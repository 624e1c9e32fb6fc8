//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{NewUser, RevokedTokenRepository, UserRepository, UserUpdate};
use crate::web::dto::{
    normalize_email, ApiResponse, AuthResponse, ChangePasswordRequest, LoginRequest,
    RegisterRequest, UpdateProfileRequest, UserData, UserResponse, ValidatedJson,
};
use crate::web::error::{ApiError, FieldError};
use crate::web::handlers::AppState;
use crate::web::middleware::CurrentUser;

fn password_error(e: PasswordError) -> ApiError {
    match e {
        PasswordError::TooShort | PasswordError::TooLong => ApiError::bad_request(e.to_string()),
        other => ApiError::internal(other.to_string()),
    }
}

/// POST /api/auth/register - Create an account and sign in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let email = normalize_email(&req.email);
    let username = req.username.trim().to_string();

    let mut clashes = Vec::new();
    if repo.email_exists(&email).await? {
        clashes.push(FieldError::new("email", "Email already registered"));
    }
    if repo.username_exists(&username, None).await? {
        clashes.push(FieldError::new("username", "Username already taken"));
    }
    if !clashes.is_empty() {
        return Err(ApiError::conflict("User already exists").with_errors(clashes));
    }

    let password = hash_password(&req.password).map_err(password_error)?;
    let mut new_user = NewUser::new(&username, &email, password, req.full_name.trim());
    if let Some(bio) = req.bio {
        new_user = new_user.with_bio(bio.trim());
    }
    let user = repo.create(&new_user).await?;
    let token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            "User registered successfully",
            AuthResponse {
                token,
                user: user.into(),
            },
        )),
    ))
}

/// POST /api/auth/login - Sign in with email and password.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let repo = UserRepository::new(state.db.pool());
    let user = repo
        .get_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if verify_password(&req.password, &user.password).is_err() {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    repo.update_last_login(user.id).await?;
    let token = state.tokens.issue(user.id)?;
    let user = repo.get_by_id(user.id).await?.unwrap_or(user);

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(ApiResponse::new(
        "Login successful",
        AuthResponse {
            token,
            user: user.into(),
        },
    )))
}

/// POST /api/auth/logout - Revoke the presented token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let expires_at = state
        .tokens
        .peek(&current.token)
        .and_then(|claims| claims.expires_at());

    RevokedTokenRepository::new(state.db.pool())
        .revoke(&current.token, expires_at.as_deref())
        .await?;

    tracing::info!(user_id = current.user.id, "User logged out");

    Ok(Json(ApiResponse::message("Logout successfully")))
}

/// GET /api/auth/me - Current user.
pub async fn me(current: CurrentUser) -> Json<ApiResponse<UserData>> {
    Json(ApiResponse::new(
        "Get me successfully",
        UserData {
            user: current.user.into(),
        },
    ))
}

/// PUT /api/auth/profile - Update display fields of the current user.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let mut update = UserUpdate::new();
    if let Some(full_name) = req.full_name {
        update = update.full_name(full_name.trim());
    }
    if let Some(bio) = req.bio {
        update = update.bio(bio.trim());
    }
    if let Some(avatar) = req.avatar {
        update = update.avatar(avatar.trim());
    }

    let user = UserRepository::new(state.db.pool())
        .update(current.user.id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::new(
        "Profile updated successfully",
        UserData {
            user: UserResponse::from(user),
        },
    )))
}

/// PUT /api/auth/change-password - Change the current user's password.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if verify_password(&req.current_password, &current.user.password).is_err() {
        return Err(ApiError::unauthorized("Invalid credentials").with_errors(vec![
            FieldError::new("currentPassword", "Invalid current password"),
        ]));
    }

    let password = hash_password(&req.new_password).map_err(password_error)?;
    UserRepository::new(state.db.pool())
        .update(current.user.id, &UserUpdate::new().password(password))
        .await?;

    tracing::info!(user_id = current.user.id, "Password changed");

    Ok(Json(ApiResponse::message("Password changed successfully")))
}
