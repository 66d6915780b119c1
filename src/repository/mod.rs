//! Store abstractions the order workflow depends on.
//!
//! The in-process implementations live in [`crate::clients`] and are backed by
//! resource actors. With the `postgres` feature, [`postgres`] provides relational ones.

use async_trait::async_trait;

use crate::domain::{
    Order, OrderCreate, OrderStatus, Page, Product, ProductCreate, ProductFilter, ProductPage,
    ProductPatch, Reservation, StockLine, User, UserCreate, UserPatch,
};
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;

#[cfg(feature = "postgres")]
pub mod postgres;

/// Product catalog persistence, including atomic stock changes.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, params: ProductCreate) -> Result<String, ProductError>;

    /// Fails with `ProductError::NotFound` for an unknown id.
    async fn get(&self, id: &str) -> Result<Product, ProductError>;

    /// Matching products ordered by name, then id.
    async fn list(&self, filter: ProductFilter, page: Page) -> Result<ProductPage, ProductError>;

    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, ProductError>;

    async fn delete(&self, id: &str) -> Result<(), ProductError>;

    async fn set_stock(&self, id: &str, stock: u32) -> Result<(), ProductError>;

    /// Signed change applied atomically; returns the new level.
    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<u32, ProductError>;

    /// Decrements every line or none of them.
    ///
    /// Each line is checked against the stock it would be taken from at the moment of
    /// the decrement, so concurrent callers can never oversell a product.
    async fn reserve(&self, lines: &[StockLine]) -> Result<Vec<Reservation>, ProductError>;

    /// Increments every line or none of them.
    async fn release(&self, lines: &[StockLine]) -> Result<(), ProductError>;
}

/// Order persistence. Orders are never deleted.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores the header and all items as one unit and returns the new order id.
    async fn save(&self, order: OrderCreate) -> Result<String, OrderError>;

    /// The order with all of its items.
    async fn find_by_id(&self, id: &str) -> Result<Order, OrderError>;

    /// Order headers of one user, newest first.
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError>;

    /// All order headers, newest first.
    async fn find_all(&self) -> Result<Vec<Order>, OrderError>;

    /// Overwrites the status without lifecycle checks.
    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), OrderError>;

    /// Atomically checks the lifecycle rule, stores the target status and returns the
    /// status the order had before.
    async fn transition(&self, id: &str, target: OrderStatus) -> Result<OrderStatus, OrderError>;
}

/// User directory.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, params: UserCreate) -> Result<String, UserError>;
    async fn get(&self, id: &str) -> Result<User, UserError>;
    async fn find_by_username(&self, username: &str) -> Result<User, UserError>;
    async fn find_by_email(&self, email: &str) -> Result<User, UserError>;
    async fn update(&self, id: &str, patch: UserPatch) -> Result<User, UserError>;
    async fn delete(&self, id: &str) -> Result<(), UserError>;
}

/// Sorts by creation time, newest first; ties fall back to descending id.
pub(crate) fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// Sorts by name, then id, and cuts out the requested page.
pub(crate) fn paginate(mut products: Vec<Product>, page: Page) -> ProductPage {
    let page = page.normalized();
    products.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    let total = products.len();
    let products = products
        .into_iter()
        .skip(page.offset())
        .take(page.per_page as usize)
        .collect();
    ProductPage {
        products,
        total,
        page: page.page,
        per_page: page.per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    #[test]
    fn test_paginate_sorts_and_counts() {
        let products = (1..=5)
            .rev()
            .map(|i| Product::new(format!("p{}", i), format!("item {}", i), Decimal::ONE, 1))
            .collect();
        let page = paginate(products, Page::new(2, 2));
        assert_eq!(page.total, 5);
        let names: Vec<_> = page.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["item 3", "item 4"]);
    }

    #[test]
    fn test_paginate_past_the_end_is_empty() {
        let products = vec![Product::new("p1", "a", Decimal::ONE, 1)];
        let page = paginate(products, Page::new(3, 10));
        assert_eq!(page.total, 1);
        assert!(page.products.is_empty());
    }

    #[test]
    fn test_sort_newest_first() {
        let now = Utc::now();
        let order = |id: &str, age_secs: i64| Order {
            id: id.into(),
            user_id: "u".into(),
            total_price: Decimal::ZERO,
            status: OrderStatus::Pending,
            created_at: now - Duration::seconds(age_secs),
            items: vec![],
        };
        let mut orders = vec![order("old", 10), order("new", 0), order("mid", 5)];
        sort_newest_first(&mut orders);
        let ids: Vec<_> = orders.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}
