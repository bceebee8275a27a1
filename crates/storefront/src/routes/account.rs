//! Account route handlers (profile and password).

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::UserRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::{CurrentUser, session_keys};
use crate::models::user::User;
use crate::services::auth::{AuthService, validate_name};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// GET /account
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_owned()))?;
    Ok(Json(user))
}

/// PATCH /account
///
/// Also refreshes the session snapshot so new reviews carry the new name.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let name = validate_name(&body.name)?;
    let updated = UserRepository::new(state.pool())
        .update_name(user.id, name)
        .await?;

    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&updated))
        .await?;
    Ok(Json(updated))
}

/// POST /account/password
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;

    // Rotates the session ID.
    set_current_user(&session, &user).await?;
    tracing::info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}
