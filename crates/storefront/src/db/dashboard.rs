//! Aggregate queries for the admin dashboard.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use bazaar_core::OrderStatus;

use super::RepositoryError;

/// Number of orders in one status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Catalog and order totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub products: i64,
    pub active_products: i64,
    pub users: i64,
    pub orders: i64,
    /// Can exceed the single-price ceiling of `Money`, so kept as a plain decimal.
    pub revenue: Decimal,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Headline counts. Revenue sums every order that was not cancelled.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<Totals, RepositoryError> {
        let (products, active_products, users, orders, revenue) =
            sqlx::query_as::<_, (i64, i64, i64, i64, Decimal)>(
                r"
                SELECT
                    (SELECT COUNT(*) FROM storefront.product),
                    (SELECT COUNT(*) FROM storefront.product WHERE status = 'active'),
                    (SELECT COUNT(*) FROM storefront.user),
                    (SELECT COUNT(*) FROM storefront.order),
                    (SELECT COALESCE(SUM(total), 0) FROM storefront.order
                     WHERE status <> 'cancelled')
                ",
            )
            .fetch_one(self.pool)
            .await?;

        Ok(Totals {
            products,
            active_products,
            users,
            orders,
            revenue,
        })
    }

    /// Order count for every status, zeros included, in lifecycle order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_status(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM storefront.order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(OrderStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: rows
                    .iter()
                    .find(|row| row.status == status)
                    .map_or(0, |row| row.count),
            })
            .collect())
    }
}
