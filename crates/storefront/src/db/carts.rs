//! Cart repository for database operations.

use sqlx::{PgConnection, PgPool};

use bazaar_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::{CartLine, MAX_LINE_QUANTITY};

const CART_LINE_COLUMNS: &str = r"
    SELECT c.product_id, p.name, p.price, p.images, c.quantity, p.inventory, p.status
    FROM storefront.cart_item c
    JOIN storefront.product p ON p.id = c.product_id
    WHERE c.user_id = $1
";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines joined with current product data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(&format!(
            "{CART_LINE_COLUMNS} ORDER BY c.added_at ASC, c.product_id ASC"
        ))
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(lines)
    }

    /// Cart lines for checkout, locking the referenced product rows.
    ///
    /// Rows are locked in product id order, the same order every other
    /// multi-product write uses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_checkout(
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(&format!(
            "{CART_LINE_COLUMNS} ORDER BY p.id ASC FOR UPDATE OF p"
        ))
            .bind(user_id)
            .fetch_all(conn)
            .await?;
        Ok(lines)
    }

    /// Add to a line, creating it if needed. The total is capped at the line maximum.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.cart_item (user_id, product_id, quantity)
            VALUES ($1, $2, LEAST($3, $4))
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = LEAST(storefront.cart_item.quantity + EXCLUDED.quantity, $4)
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(MAX_LINE_QUANTITY)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.cart_item SET quantity = $3
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't exist.
    pub async fn remove(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(conn: &mut PgConnection, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Replace the whole cart with `lines` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn replace(
        &self,
        user_id: UserId,
        lines: &[(ProductId, i32)],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        Self::clear(&mut tx, user_id).await?;
        for (product_id, quantity) in lines {
            sqlx::query(
                r"
                INSERT INTO storefront.cart_item (user_id, product_id, quantity)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
