//! Postgres-backed product and order stores.
//!
//! Stock changes are single conditional `UPDATE` statements, so a decrement can only
//! succeed against the stock the row holds at that instant. Multi-line reservations and
//! order saves each run in one transaction; an error drops the transaction, which rolls
//! it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{OrderRepository, ProductRepository};
use crate::domain::{
    Order, OrderCreate, OrderItem, OrderStatus, Page, Product, ProductCreate, ProductFilter,
    ProductPage, ProductPatch, Reservation, StockLine,
};
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id    TEXT PRIMARY KEY,
        name  TEXT NOT NULL,
        price NUMERIC NOT NULL CHECK (price >= 0),
        stock BIGINT NOT NULL CHECK (stock >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL,
        total_price NUMERIC NOT NULL,
        status      TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id         TEXT PRIMARY KEY,
        order_id   TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        position   INTEGER NOT NULL,
        product_id TEXT NOT NULL,
        quantity   BIGINT NOT NULL CHECK (quantity > 0),
        price      NUMERIC NOT NULL
    )
    "#,
];

/// Creates the tables if they do not exist yet.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

fn product_db_error(operation: &str, err: sqlx::Error) -> ProductError {
    ProductError::DatabaseError(format!("{}: {}", operation, err))
}

fn order_db_error(operation: &str, err: sqlx::Error) -> OrderError {
    OrderError::DatabaseError(format!("{}: {}", operation, err))
}

fn to_u32(value: i64, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("{} out of range: {}", column, value))
}

fn product_from_row(row: &PgRow) -> Result<Product, ProductError> {
    let read = || -> Result<Product, sqlx::Error> {
        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            stock: 0,
        })
    };
    let mut product = read().map_err(|e| product_db_error("decode product", e))?;
    let stock: i64 = row
        .try_get("stock")
        .map_err(|e| product_db_error("decode product", e))?;
    product.stock = to_u32(stock, "stock").map_err(ProductError::DatabaseError)?;
    Ok(product)
}

fn order_from_row(row: &PgRow) -> Result<Order, OrderError> {
    let status: String = row.try_get("status").map_err(|e| order_db_error("decode order", e))?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| OrderError::DatabaseError(e.to_string()))?;
    let read = || -> Result<Order, sqlx::Error> {
        Ok(Order {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            total_price: row.try_get("total_price")?,
            status,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            items: Vec::new(),
        })
    };
    read().map_err(|e| order_db_error("decode order", e))
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, OrderError> {
    let read = || -> Result<(OrderItem, i64), sqlx::Error> {
        let item = OrderItem {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            product: None,
            quantity: 0,
            price: row.try_get("price")?,
        };
        Ok((item, row.try_get("quantity")?))
    };
    let (mut item, quantity) = read().map_err(|e| order_db_error("decode order item", e))?;
    item.quantity = to_u32(quantity, "quantity").map_err(OrderError::DatabaseError)?;
    Ok(item)
}

/// Product catalog on Postgres.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distinguishes a missing product from one whose stock is too low.
    async fn stock_failure(
        tx: &mut Transaction<'_, Postgres>,
        product_id: &str,
        requested: u32,
    ) -> ProductError {
        let row = sqlx::query("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await;
        match row {
            Ok(None) => ProductError::NotFound(product_id.to_string()),
            Ok(Some(row)) => {
                let available = row
                    .try_get::<i64, _>("stock")
                    .ok()
                    .and_then(|stock| u32::try_from(stock).ok())
                    .unwrap_or(0);
                ProductError::InsufficientStock {
                    product_id: product_id.to_string(),
                    requested,
                    available,
                }
            }
            Err(err) => product_db_error("stock lookup", err),
        }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    #[instrument(skip(self, params), fields(name = %params.name))]
    async fn create(&self, params: ProductCreate) -> Result<String, ProductError> {
        if params.name.trim().is_empty() {
            return Err(ProductError::ValidationError("name must not be empty".into()));
        }
        if params.price < Decimal::ZERO {
            return Err(ProductError::ValidationError(format!(
                "price must not be negative: {}",
                params.price
            )));
        }
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO products (id, name, price, stock) VALUES ($1, $2, $3, $4)")
            .bind(&id)
            .bind(&params.name)
            .bind(params.price)
            .bind(i64::from(params.stock))
            .execute(&self.pool)
            .await
            .map_err(|e| product_db_error("insert product", e))?;
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Product, ProductError> {
        let row = sqlx::query("SELECT id, name, price, stock FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| product_db_error("select product", e))?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;
        product_from_row(&row)
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter, page: Page) -> Result<ProductPage, ProductError> {
        const WHERE: &str = "WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%') \
             AND ($2::NUMERIC IS NULL OR price >= $2) \
             AND ($3::NUMERIC IS NULL OR price <= $3)";
        let page = page.normalized();

        let total: i64 = sqlx::query(&format!("SELECT COUNT(*) AS total FROM products {}", WHERE))
            .bind(&filter.name)
            .bind(filter.min_price)
            .bind(filter.max_price)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| product_db_error("count products", e))?;

        let rows = sqlx::query(&format!(
            "SELECT id, name, price, stock FROM products {} ORDER BY name, id LIMIT $4 OFFSET $5",
            WHERE
        ))
        .bind(&filter.name)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(i64::from(page.per_page))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| product_db_error("select products", e))?;

        let products = rows.iter().map(product_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(ProductPage {
            products,
            total: usize::try_from(total).unwrap_or(0),
            page: page.page,
            per_page: page.per_page,
        })
    }

    #[instrument(skip(self))]
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, ProductError> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(ProductError::ValidationError("name must not be empty".into()));
            }
        }
        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(ProductError::ValidationError(format!(
                    "price must not be negative: {}",
                    price
                )));
            }
        }
        let row = sqlx::query(
            "UPDATE products SET name = COALESCE($2, name), price = COALESCE($3, price), \
             stock = COALESCE($4, stock) WHERE id = $1 RETURNING id, name, price, stock",
        )
        .bind(id)
        .bind(patch.name)
        .bind(patch.price)
        .bind(patch.stock.map(i64::from))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| product_db_error("update product", e))?
        .ok_or_else(|| ProductError::NotFound(id.to_string()))?;
        product_from_row(&row)
    }

    async fn delete(&self, id: &str) -> Result<(), ProductError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| product_db_error("delete product", e))?;
        if result.rows_affected() == 0 {
            return Err(ProductError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_stock(&self, id: &str, stock: u32) -> Result<(), ProductError> {
        let result = sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(id)
            .bind(i64::from(stock))
            .execute(&self.pool)
            .await
            .map_err(|e| product_db_error("set stock", e))?;
        if result.rows_affected() == 0 {
            return Err(ProductError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<u32, ProductError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| product_db_error("begin", e))?;
        let row = sqlx::query(
            "UPDATE products SET stock = stock + $2 WHERE id = $1 AND stock + $2 >= 0 RETURNING stock",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| product_db_error("adjust stock", e))?;
        let Some(row) = row else {
            let requested = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);
            return Err(Self::stock_failure(&mut tx, id, requested).await);
        };
        let stock: i64 = row
            .try_get("stock")
            .map_err(|e| product_db_error("adjust stock", e))?;
        tx.commit().await.map_err(|e| product_db_error("commit", e))?;
        to_u32(stock, "stock").map_err(ProductError::DatabaseError)
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn reserve(&self, lines: &[StockLine]) -> Result<Vec<Reservation>, ProductError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| product_db_error("begin", e))?;
        let mut reservations = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(ProductError::InvalidQuantity("reserved quantity must be positive".into()));
            }
            let row = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 \
                 RETURNING price, stock",
            )
            .bind(&line.product_id)
            .bind(i64::from(line.quantity))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| product_db_error("reserve stock", e))?;
            let Some(row) = row else {
                return Err(Self::stock_failure(&mut tx, &line.product_id, line.quantity).await);
            };
            let unit_price: Decimal = row
                .try_get("price")
                .map_err(|e| product_db_error("reserve stock", e))?;
            let remaining: i64 = row
                .try_get("stock")
                .map_err(|e| product_db_error("reserve stock", e))?;
            reservations.push(Reservation {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price,
                remaining: to_u32(remaining, "stock").map_err(ProductError::DatabaseError)?,
            });
        }
        tx.commit().await.map_err(|e| product_db_error("commit", e))?;
        debug!(reserved = reservations.len(), "Stock reserved");
        Ok(reservations)
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn release(&self, lines: &[StockLine]) -> Result<(), ProductError> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| product_db_error("begin", e))?;
        for line in lines {
            let result = sqlx::query("UPDATE products SET stock = stock + $2 WHERE id = $1")
                .bind(&line.product_id)
                .bind(i64::from(line.quantity))
                .execute(&mut *tx)
                .await
                .map_err(|e| product_db_error("release stock", e))?;
            if result.rows_affected() == 0 {
                return Err(ProductError::NotFound(line.product_id.clone()));
            }
        }
        tx.commit().await.map_err(|e| product_db_error("commit", e))
    }
}

/// Orders and their items on Postgres.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn headers(&self, user_id: Option<&str>) -> Result<Vec<Order>, OrderError> {
        let rows = sqlx::query(
            "SELECT id, user_id, total_price, status, created_at FROM orders \
             WHERE ($1::TEXT IS NULL OR user_id = $1) ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| order_db_error("select orders", e))?;
        rows.iter().map(order_from_row).collect()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    #[instrument(skip(self, order), fields(user_id = %order.user_id, items = order.items.len()))]
    async fn save(&self, order: OrderCreate) -> Result<String, OrderError> {
        if order.items.is_empty() {
            return Err(OrderError::ValidationError("order must have at least one item".into()));
        }
        let id = Uuid::new_v4().to_string();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| order_db_error("begin", e))?;
        sqlx::query(
            "INSERT INTO orders (id, user_id, total_price, status, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(&order.user_id)
        .bind(order.total_price)
        .bind(OrderStatus::Pending.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| order_db_error("insert order", e))?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, position, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .bind(&item.product_id)
            .bind(i64::from(item.quantity))
            .bind(item.price)
            .execute(&mut *tx)
            .await
            .map_err(|e| order_db_error("insert order item", e))?;
        }

        tx.commit().await.map_err(|e| order_db_error("commit", e))?;
        Ok(id)
    }

    async fn find_by_id(&self, id: &str) -> Result<Order, OrderError> {
        let row = sqlx::query(
            "SELECT id, user_id, total_price, status, created_at FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| order_db_error("select order", e))?
        .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let mut order = order_from_row(&row)?;

        let rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity, price FROM order_items \
             WHERE order_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| order_db_error("select order items", e))?;
        order.items = rows.iter().map(item_from_row).collect::<Result<_, _>>()?;
        Ok(order)
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        self.headers(Some(user_id)).await
    }

    async fn find_all(&self) -> Result<Vec<Order>, OrderError> {
        self.headers(None).await
    }

    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), OrderError> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| order_db_error("update status", e))?;
        if result.rows_affected() == 0 {
            return Err(OrderError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn transition(&self, id: &str, target: OrderStatus) -> Result<OrderStatus, OrderError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| order_db_error("begin", e))?;
        let row = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| order_db_error("lock order", e))?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let previous: String = row
            .try_get("status")
            .map_err(|e| order_db_error("lock order", e))?;
        let previous = previous
            .parse::<OrderStatus>()
            .map_err(|e| OrderError::DatabaseError(e.to_string()))?;

        if !previous.can_transition_to(target) {
            return Err(OrderError::InvalidStatusTransition { from: previous, to: target });
        }
        if previous != target {
            sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
                .bind(id)
                .bind(target.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| order_db_error("update status", e))?;
        }
        tx.commit().await.map_err(|e| order_db_error("commit", e))?;
        Ok(previous)
    }
}
