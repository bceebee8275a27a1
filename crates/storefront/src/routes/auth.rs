//! Authentication route handlers.
//!
//! Register, login, logout, current user, and password reset.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{ApiJson, AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// POST /auth/register
///
/// Creates the account and logs it in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(&body.name, &body.email, &body.password)
        .await?;

    start_session(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

/// POST /auth/logout
///
/// Always succeeds, with or without a session.
#[instrument(skip_all)]
pub async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User logged out");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
#[instrument(skip_all)]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_owned()))?;
    Ok(Json(user))
}

/// POST /auth/forgot-password
///
/// Responds the same whether or not the email has an account.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let issued = AuthService::new(state.pool())
        .request_password_reset(&body.email, Utc::now())
        .await?;

    if let Some(issued) = issued {
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config().base_url.trim_end_matches('/'),
            issued.token
        );
        tracing::debug!(
            user_id = %issued.user_id,
            expires_at = %issued.expires_at,
            reset_url = %reset_url,
            "Password reset token issued"
        );
    }

    Ok(Json(MessageResponse {
        message: "If an account exists for that email, a reset link has been sent",
    }))
}

/// POST /auth/reset-password
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .reset_password(&body.token, &body.password, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
