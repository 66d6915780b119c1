use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::product::Product;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown order status: {0:?}")]
pub struct ParseStatusError(pub String);

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled orders accept no further business transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Re-applying the current status is always allowed and changes nothing.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        *self == target || !self.is_terminal()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Represents a customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// The order without its line items, as returned by list queries.
    pub fn header(&self) -> Order {
        Order {
            items: Vec::new(),
            ..self.clone()
        }
    }

    pub fn stock_lines(&self) -> Vec<super::StockLine> {
        self.items
            .iter()
            .map(|item| super::StockLine::new(item.product_id.clone(), item.quantity))
            .collect()
    }
}

/// One product line of an order. Price and quantity never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Current product state, attached for display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    pub quantity: u32,
    pub price: Decimal,
}

/// Payload for persisting a new order together with its items.
///
/// The total is derived from the items by [`OrderCreate::new`]; stores keep it as given.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub user_id: String,
    pub total_price: Decimal,
    pub items: Vec<NewOrderItem>,
}

impl OrderCreate {
    pub fn new(user_id: impl Into<String>, items: Vec<NewOrderItem>) -> Result<Self, PriceOverflow> {
        Ok(Self {
            user_id: user_id.into(),
            total_price: total_price(&items)?,
            items,
        })
    }
}

/// A priced line waiting to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Order total exceeds the representable amount at product {product_id}")]
pub struct PriceOverflow {
    pub product_id: String,
}

/// Sum of unit price times quantity over all lines.
pub fn total_price(items: &[NewOrderItem]) -> Result<Decimal, PriceOverflow> {
    items.iter().try_fold(Decimal::ZERO, |total, item| {
        item.price
            .checked_mul(Decimal::from(item.quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| PriceOverflow {
                product_id: item.product_id.clone(),
            })
    })
}

/// Selects orders for list queries; `None` means every order.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<String>,
}

/// Incoming request to place an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItemRequest>,
}

/// Requested quantity of one product. Signed so that bad input can be reported, not wrapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl OrderRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items: Vec::new(),
        }
    }

    pub fn item(mut self, product_id: impl Into<String>, quantity: i64) -> Self {
        self.items.push(OrderItemRequest {
            product_id: product_id.into(),
            quantity,
        });
        self
    }
}
