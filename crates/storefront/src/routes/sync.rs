//! Rating resynchronization trigger.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::ratings::{RatingSynchronizer, SyncReport};
use crate::state::AppState;

/// GET /sync-ratings, POST /admin/sync-ratings
///
/// Recomputes every product's stored rating from its reviews.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn sync_ratings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<SyncReport>> {
    let report = RatingSynchronizer::new(state.pool()).recompute_all().await?;
    tracing::info!(
        scanned = report.scanned,
        updated = report.updated,
        without_reviews = report.without_reviews,
        "Ratings resynchronized"
    );
    Ok(Json(report))
}
