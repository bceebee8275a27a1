//! Cart types. Totals are derived from the lines on every read.

use serde::Serialize;

use bazaar_core::{Money, ProductId, ProductStatus};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// A cart line joined with the product's current name, price and images.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub images: Vec<String>,
    pub quantity: i32,
    pub inventory: i32,
    pub status: ProductStatus,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price.times(u32::try_from(self.quantity).unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    #[serde(flatten)]
    pub line: CartLine,
    pub line_total: Money,
}

/// The cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItemView>,
    pub total: Money,
    pub item_count: i64,
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::line_total).sum();
        let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let items = lines
            .into_iter()
            .map(|line| CartItemView {
                line_total: line.line_total(),
                line,
            })
            .collect();
        Self {
            items,
            total,
            item_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i64, cents: u32, quantity: i32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_cents(cents),
            images: vec![],
            quantity,
            inventory: 10,
            status: ProductStatus::Active,
        }
    }

    #[test]
    fn test_cart_totals() {
        let cart = Cart::from(vec![line(1, 1999, 2), line(2, 500, 1)]);
        assert_eq!(cart.item_count, 3);
        assert_eq!(cart.total, Money::from_cents(4498));
        assert_eq!(cart.items[0].line_total, Money::from_cents(3998));
    }

    #[test]
    fn test_empty_cart() {
        let cart = Cart::from(Vec::new());
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.total, Money::zero());

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["itemCount"], 0);
        assert!(json["items"].as_array().unwrap().is_empty());
    }
}
