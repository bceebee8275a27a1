//! Review route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{ProductId, ReviewId};

use crate::error::{ApiJson, ApiPath, ApiQuery, Result};
use crate::middleware::RequireAuth;
use crate::models::PageRequest;
use crate::models::review::{Review, ReviewSort};
use crate::services::reviews::{
    DEFAULT_REVIEW_PAGE_SIZE, ReviewInput, ReviewListing, ReviewService, SubmittedReview,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<ReviewSort>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeedbackRequest {
    pub helpful: bool,
}

/// GET /products/{id}/reviews
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> Result<Json<ReviewListing>> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_REVIEW_PAGE_SIZE)?;
    let listing = ReviewService::new(state.pool())
        .list(product_id, query.sort.unwrap_or_default(), page)
        .await?;
    Ok(Json(listing))
}

/// POST /products/{id}/reviews
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<SubmittedReview>)> {
    let input = body.validate()?;
    let submitted = ReviewService::new(state.pool())
        .submit(product_id, &user, input)
        .await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

/// POST /reviews/{id}/feedback
#[instrument(skip(state, _user))]
pub async fn feedback(
    State(state): State<AppState>,
    ApiPath(review_id): ApiPath<ReviewId>,
    RequireAuth(_user): RequireAuth,
    ApiJson(body): ApiJson<FeedbackRequest>,
) -> Result<Json<Review>> {
    let review = ReviewService::new(state.pool())
        .feedback(review_id, body.helpful)
        .await?;
    Ok(Json(review))
}
