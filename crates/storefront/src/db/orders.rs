//! Order repository for database operations.

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use bazaar_core::{Money, OrderId, OrderNumber, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::PageRequest;
use crate::models::order::{Order, OrderItem, OrderNote, ShippingInfo};

const ORDER_COLUMNS: &str =
    "id, order_number, user_id, status, shipping_info, subtotal, total, created_at, updated_at";

/// Attempts at finding an unused order number before giving up.
pub const MAX_ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order header under a freshly generated order number.
    ///
    /// # Errors
    ///
    /// See [`OrderRepository::create_numbered`].
    pub async fn create(
        conn: &mut PgConnection,
        user_id: UserId,
        shipping: &ShippingInfo,
        subtotal: Money,
        total: Money,
    ) -> Result<Order, RepositoryError> {
        Self::create_numbered(conn, user_id, shipping, subtotal, total, || {
            OrderNumber::generate(Utc::now(), &mut rand::rng())
        })
        .await
    }

    /// Insert an order header under a number drawn from `next_number`.
    ///
    /// A number that collides with an existing order is replaced by the next
    /// one, up to [`MAX_ORDER_NUMBER_ATTEMPTS`] draws in total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if every attempt collided.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_numbered<F>(
        conn: &mut PgConnection,
        user_id: UserId,
        shipping: &ShippingInfo,
        subtotal: Money,
        total: Money,
        mut next_number: F,
    ) -> Result<Order, RepositoryError>
    where
        F: FnMut() -> OrderNumber + Send,
    {
        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let number = next_number();
            let inserted = sqlx::query_as::<_, Order>(&format!(
                r"
                INSERT INTO storefront.order (order_number, user_id, shipping_info, subtotal, total)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (order_number) DO NOTHING
                RETURNING {ORDER_COLUMNS}
                "
            ))
            .bind(&number)
            .bind(user_id)
            .bind(Json(shipping))
            .bind(subtotal)
            .bind(total)
            .fetch_optional(&mut *conn)
            .await?;

            if let Some(order) = inserted {
                return Ok(order);
            }
            tracing::warn!(order_number = %number, attempt, "Order number collision, regenerating");
        }
        Err(RepositoryError::Conflict(
            "could not allocate a unique order number".to_owned(),
        ))
    }

    /// Insert the item snapshots for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails.
    pub async fn add_items(
        conn: &mut PgConnection,
        order_id: OrderId,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        for item in items {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, name, price, images, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.name)
            .bind(item.price)
            .bind(&item.images)
            .bind(item.quantity)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }

    /// Item snapshots of an order, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(conn: &mut PgConnection, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT product_id, name, price, images, quantity
            FROM storefront.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(conn)
        .await?;
        Ok(items)
    }

    /// Item snapshots of an order, on a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_of(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::items(&mut conn, order_id).await
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Lock an order row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(order)
    }

    /// Persist a status change.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        conn: &mut PgConnection,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            r"
            UPDATE storefront.order SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(conn)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// One page of a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM storefront.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id)
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM storefront.order WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;

        Ok((orders, total))
    }

    /// One page of all orders, optionally restricted to one status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM storefront.order
            WHERE $1::storefront.order_status IS NULL OR status = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(status)
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM storefront.order
            WHERE $1::storefront.order_status IS NULL OR status = $1
            ",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Admin notes on an order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn notes(&self, order_id: OrderId) -> Result<Vec<OrderNote>, RepositoryError> {
        let notes = sqlx::query_as::<_, OrderNote>(
            r"
            SELECT n.id, n.author_id, u.name AS author_name, n.body, n.created_at
            FROM storefront.order_note n
            LEFT JOIN storefront.user u ON u.id = n.author_id
            WHERE n.order_id = $1
            ORDER BY n.created_at ASC, n.id ASC
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;
        Ok(notes)
    }

    /// Attach a note to an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn add_note(
        &self,
        order_id: OrderId,
        author_id: UserId,
        body: &str,
    ) -> Result<OrderNote, RepositoryError> {
        let note = sqlx::query_as::<_, OrderNote>(
            r"
            WITH inserted AS (
                INSERT INTO storefront.order_note (order_id, author_id, body)
                SELECT id, $2, $3 FROM storefront.order WHERE id = $1
                RETURNING id, author_id, body, created_at
            )
            SELECT i.id, i.author_id, u.name AS author_name, i.body, i.created_at
            FROM inserted i
            LEFT JOIN storefront.user u ON u.id = i.author_id
            ",
        )
        .bind(order_id)
        .bind(author_id)
        .bind(body)
        .fetch_optional(self.pool)
        .await?;
        note.ok_or(RepositoryError::NotFound)
    }
}
