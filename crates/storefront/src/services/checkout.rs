//! Checkout and order status changes.
//!
//! Both run in one transaction with the affected product rows locked, so
//! inventory never goes negative and a cancelled order restocks exactly once.
//! Product rows are always locked in ascending id order.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{Money, OrderId, OrderStatus, ProductId, StatusTransitionError, UserId};

use crate::db::{CartRepository, OrderRepository, ProductRepository, RepositoryError};
use crate::models::order::{OrderDetail, OrderItem, ShippingInfo};

/// Errors from checkout and order status changes.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("{0} is no longer available")]
    Unavailable(String),

    #[error("only {available} of {name} left in stock")]
    InsufficientStock { name: String, available: i32 },

    #[error("shipping {0} is required")]
    MissingShippingField(&'static str),

    #[error("order not found")]
    OrderNotFound,

    #[error("only pending orders can be cancelled")]
    NotCancellable,

    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the user's cart into a pending order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `Unavailable` or `InsufficientStock`
    /// when the cart can't be fulfilled; nothing is written in that case.
    #[instrument(skip(self, shipping))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping: &ShippingInfo,
    ) -> Result<OrderDetail, CheckoutError> {
        if let Some(field) = shipping.first_missing_field() {
            return Err(CheckoutError::MissingShippingField(field));
        }

        let mut tx = self.pool.begin().await?;

        let lines = CartRepository::lines_for_checkout(&mut tx, user_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if !line.status.is_public() {
                return Err(CheckoutError::Unavailable(line.name.clone()));
            }
            if line.inventory < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    name: line.name.clone(),
                    available: line.inventory,
                });
            }
            items.push(OrderItem {
                product_id: Some(line.product_id),
                name: line.name.clone(),
                price: line.price,
                images: line.images.clone(),
                quantity: line.quantity,
            });
        }

        for line in &lines {
            ProductRepository::adjust_inventory(&mut tx, line.product_id, -line.quantity).await?;
        }

        let subtotal: Money = lines.iter().map(|l| l.line_total()).sum();
        let order = OrderRepository::create(&mut tx, user_id, shipping, subtotal, subtotal).await?;
        OrderRepository::add_items(&mut tx, order.id, &items).await?;
        CartRepository::clear(&mut tx, user_id).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "Order placed"
        );
        Ok(OrderDetail {
            order,
            items,
            notes: None,
        })
    }

    /// Cancel one of the user's own orders while it is still pending.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::OrderNotFound` if the order doesn't belong to the user.
    /// Returns `CheckoutError::NotCancellable` once processing has started.
    #[instrument(skip(self))]
    pub async fn cancel_own(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<OrderDetail, CheckoutError> {
        self.change_status(order_id, OrderStatus::Cancelled, Some(user_id))
            .await
    }

    /// Move an order to `next`, restocking inventory on cancellation.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidTransition` if the status machine forbids it.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderDetail, CheckoutError> {
        self.change_status(order_id, next, None).await
    }

    async fn change_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
        owner: Option<UserId>,
    ) -> Result<OrderDetail, CheckoutError> {
        let mut tx = self.pool.begin().await?;

        let order = OrderRepository::lock_for_update(&mut tx, order_id)
            .await?
            .filter(|o| owner.is_none_or(|user_id| o.user_id == user_id))
            .ok_or(CheckoutError::OrderNotFound)?;

        if owner.is_some() && order.status != OrderStatus::Pending {
            return Err(CheckoutError::NotCancellable);
        }

        let next = order.status.transition_to(next)?;
        let items = OrderRepository::items(&mut tx, order_id).await?;

        if next == OrderStatus::Cancelled {
            restock(&mut tx, &items).await?;
        }

        let order = OrderRepository::set_status(&mut tx, order_id, next).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order_id, status = %next, "Order status changed");
        Ok(OrderDetail {
            order,
            items,
            notes: None,
        })
    }
}

/// Return cancelled items to stock, skipping products deleted since the order.
async fn restock(conn: &mut PgConnection, items: &[OrderItem]) -> Result<(), CheckoutError> {
    let mut restocks: Vec<(ProductId, i32)> = items
        .iter()
        .filter_map(|item| item.product_id.map(|id| (id, item.quantity)))
        .collect();
    restocks.sort_unstable_by_key(|(id, _)| *id);

    let ids: Vec<ProductId> = restocks.iter().map(|(id, _)| *id).collect();
    let existing = ProductRepository::lock_many(conn, &ids).await?;

    for (product_id, quantity) in restocks {
        if existing.binary_search(&product_id).is_ok() {
            ProductRepository::adjust_inventory(conn, product_id, quantity).await?;
        }
    }
    Ok(())
}
