//! Admin user management.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{UserId, UserRole};

use crate::db::{RepositoryError, UserRepository};
use crate::error::{ApiJson, ApiPath, ApiQuery, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::user::{User, UserSummary};
use crate::models::{Page, PageRequest};
use crate::state::AppState;

const DEFAULT_USER_PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoleUpdateRequest {
    pub role: UserRole,
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_owned())
}

/// GET /admin/users
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Page<UserSummary>>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_USER_PAGE_SIZE)?;
    let (users, total) = UserRepository::new(state.pool()).list(page).await?;
    Ok(Json(Page::new(users, page, total)))
}

/// GET /admin/users/{id}
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}

/// PATCH /admin/users/{id}/role
///
/// An admin cannot change their own role.
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id, role = %body.role))]
pub async fn update_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<RoleUpdateRequest>,
) -> Result<Json<User>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "you cannot change your own role".to_owned(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .set_role(id, body.role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => user_not_found(),
            other => other.into(),
        })?;
    tracing::info!("User role changed");
    Ok(Json(user))
}
