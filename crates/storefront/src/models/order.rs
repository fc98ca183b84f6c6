//! Orders and their line items.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use greenshop_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// A placed order with the buyer's contact snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Owner; `None` for guest orders or after the user was deleted.
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub notes: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    #[must_use]
    pub fn created_display(&self) -> String {
        self.created_at.format("%d.%m.%Y %H:%M").to_string()
    }
}

/// A stored order line.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub unit_price: Decimal,
}

impl OrderItem {
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order line joined with the product's name and slug.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemDetail {
    #[sqlx(flatten)]
    pub item: OrderItem,
    pub product_name: String,
    pub product_slug: String,
}

impl OrderItemDetail {
    #[must_use]
    pub fn unit_price_display(&self) -> String {
        Price::store(self.item.unit_price).display()
    }

    #[must_use]
    pub fn total_display(&self) -> String {
        Price::store(self.item.total_price()).display()
    }
}

/// An order together with its lines.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

impl OrderWithItems {
    /// Sum of line totals.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.items.iter().map(|detail| detail.item.total_price()).sum()
    }

    #[must_use]
    pub fn total_display(&self) -> String {
        Price::store(self.total_amount()).display()
    }
}

/// Buyer details for a new order, taken from the checkout form.
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub notes: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn detail(quantity: i32, unit_price: &str) -> OrderItemDetail {
        OrderItemDetail {
            item: OrderItem {
                id: OrderItemId::new(1),
                order_id: OrderId::new(1),
                product_id: ProductId::new(1),
                quantity,
                unit_price: unit_price.parse().unwrap(),
            },
            product_name: "Thermos".to_owned(),
            product_slug: "thermos".to_owned(),
        }
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            user_id: None,
            first_name: "Anna".to_owned(),
            last_name: "Petrova".to_owned(),
            email: "anna@example.com".to_owned(),
            phone: "+7 900 000 00 00".to_owned(),
            address: "Lenina 1".to_owned(),
            city: "Kazan".to_owned(),
            postal_code: "420000".to_owned(),
            notes: String::new(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_amount_sums_line_totals() {
        let with_items = OrderWithItems {
            order: order(),
            items: vec![detail(2, "1590.00"), detail(1, "290.00")],
        };
        assert_eq!(with_items.total_amount(), "3470.00".parse::<Decimal>().unwrap());
        assert_eq!(with_items.total_display(), "3470.00 ₽");
    }

    #[test]
    fn test_empty_order_total_is_zero() {
        let with_items = OrderWithItems {
            order: order(),
            items: Vec::new(),
        };
        assert_eq!(with_items.total_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_full_name() {
        assert_eq!(order().full_name(), "Anna Petrova");
    }
}
