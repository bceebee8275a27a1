//! Order types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use bazaar_core::{Money, OrderId, OrderNoteId, OrderNumber, OrderStatus, ProductId, UserId};

/// Where an order ships. Stored as JSONB on the order row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingInfo {
    /// Name of the first required field that is blank, if any.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("fullName", &self.full_name),
            ("email", &self.email),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// An order header row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub shipping_info: Json<ShippingInfo>,
    pub subtotal: Money,
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A frozen product snapshot on an order.
///
/// `product_id` is `None` once the product has been deleted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Money,
    pub images: Vec<String>,
    pub quantity: i32,
}

/// An internal note left by an admin.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderNote {
    pub id: OrderNoteId,
    pub author_id: Option<UserId>,
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An order with its items, as returned to the customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<OrderNote>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: None,
            address_line1: "12 Analytical Way".to_owned(),
            address_line2: None,
            city: "London".to_owned(),
            state: "LDN".to_owned(),
            postal_code: "N1 9GU".to_owned(),
            country: "GB".to_owned(),
        }
    }

    #[test]
    fn test_shipping_info_missing_field() {
        assert_eq!(shipping().first_missing_field(), None);
        let info = ShippingInfo {
            city: "  ".to_owned(),
            ..shipping()
        };
        assert_eq!(info.first_missing_field(), Some("city"));
    }

    #[test]
    fn test_shipping_info_rejects_unknown_fields() {
        let mut json = serde_json::to_value(shipping()).unwrap();
        json["giftWrap"] = serde_json::Value::Bool(true);
        assert!(serde_json::from_value::<ShippingInfo>(json).is_err());
    }
}
