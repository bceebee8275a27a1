//! Rating resynchronization commands.

use bazaar_core::ProductId;
use bazaar_storefront::services::ratings::{RatingSynchronizer, RecomputeOutcome};

use super::{CliError, connect};

/// Recompute every product's stored rating.
pub async fn sync_all() -> Result<(), CliError> {
    let pool = connect().await?;
    let report = RatingSynchronizer::new(&pool).recompute_all().await?;

    tracing::info!("Rating sync complete!");
    tracing::info!("  Products scanned: {}", report.scanned);
    tracing::info!("  Updated: {}", report.updated);
    tracing::info!("  Without reviews (left as is): {}", report.without_reviews);
    Ok(())
}

/// Recompute one product's stored rating.
pub async fn sync_one(product_id: ProductId) -> Result<(), CliError> {
    let pool = connect().await?;

    match RatingSynchronizer::new(&pool).recompute_one(product_id).await? {
        RecomputeOutcome::Updated(summary) => tracing::info!(
            %product_id,
            rating = summary.rating,
            review_count = summary.review_count,
            "Rating updated"
        ),
        RecomputeOutcome::NoReviews => {
            tracing::info!(%product_id, "Product has no reviews; rating left as is");
        }
    }
    Ok(())
}
