use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use super::deadline::Deadline;
use super::inventory::{InventoryService, StockCheck};
use crate::domain::{NewOrderItem, Order, OrderCreate, OrderRequest, OrderStatus, StockLine};
use crate::error::ServiceError;
use crate::repository::{OrderRepository, ProductRepository, UserRepository};

/// Prefix of the `Internal` message for a cancelled order whose stock is still out.
pub const UNRESTOCKED_CANCEL: &str = "unrestocked cancel";

/// The order workflow: creation, status lifecycle and reads.
///
/// Stock is reserved atomically before the order is written. If writing fails, or the
/// deadline runs out in between, the reservation is handed back, so a failed order
/// never leaves stock changes behind.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    inventory: InventoryService,
    users: Option<Arc<dyn UserRepository>>,
    default_timeout: Option<Duration>,
}

/// Checks the request shape and turns it into stock lines.
fn validate(request: &OrderRequest) -> Result<Vec<StockLine>, ServiceError> {
    if request.user_id.trim().is_empty() {
        return Err(ServiceError::InvalidArgument("user id must not be empty".into()));
    }
    if request.items.is_empty() {
        return Err(ServiceError::InvalidArgument("order must contain at least one item".into()));
    }
    request
        .items
        .iter()
        .map(|item| {
            if item.product_id.trim().is_empty() {
                return Err(ServiceError::InvalidArgument("product id must not be empty".into()));
            }
            if item.quantity < 1 {
                return Err(ServiceError::InvalidArgument(format!(
                    "quantity for product {} must be at least 1, got {}",
                    item.product_id, item.quantity
                )));
            }
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                ServiceError::InvalidArgument(format!(
                    "quantity for product {} is too large: {}",
                    item.product_id, item.quantity
                ))
            })?;
            Ok(StockLine::new(item.product_id.clone(), quantity))
        })
        .collect()
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrderRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self {
            orders,
            inventory: InventoryService::new(products),
            users: None,
            default_timeout: None,
        }
    }

    /// Orders for unknown users are rejected once a directory is attached.
    pub fn with_users(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    fn default_deadline(&self) -> Deadline {
        Deadline::from_timeout(self.default_timeout)
    }

    pub async fn create_order(&self, request: OrderRequest) -> Result<String, ServiceError> {
        self.create_order_with_deadline(request, self.default_deadline()).await
    }

    /// Places an order and returns its id.
    #[instrument(skip(self, request, deadline), fields(user_id = %request.user_id, items = request.items.len()))]
    pub async fn create_order_with_deadline(
        &self,
        request: OrderRequest,
        deadline: Deadline,
    ) -> Result<String, ServiceError> {
        let lines = validate(&request)?;

        if let Some(users) = &self.users {
            deadline.run("user lookup", users.get(&request.user_id)).await?;
        }

        match deadline.run("stock check", self.inventory.check_stock(&lines)).await? {
            StockCheck::Available => {}
            StockCheck::Unavailable(shortage) => {
                info!(product_id = %shortage.product_id, "Order rejected");
                return Err(shortage.into());
            }
        }

        deadline.check("stock reservation")?;
        let reservations = self.inventory.update_stock(&lines).await?;

        let items = reservations
            .into_iter()
            .map(|reservation| NewOrderItem {
                product_id: reservation.product_id,
                quantity: reservation.quantity,
                price: reservation.unit_price,
            })
            .collect();
        let order = match OrderCreate::new(request.user_id, items) {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "Order total out of range");
                self.compensate(&lines).await;
                return Err(err.into());
            }
        };

        if let Err(err) = deadline.check("order save") {
            self.compensate(&lines).await;
            return Err(err);
        }

        match self.orders.save(order).await {
            Ok(order_id) => {
                info!(%order_id, "Order created");
                Ok(order_id)
            }
            Err(err) => {
                error!(error = %err, "Failed to save order");
                self.compensate(&lines).await;
                Err(ServiceError::Internal(err.to_string()))
            }
        }
    }

    /// Hands reserved stock back after a failed creation.
    async fn compensate(&self, lines: &[StockLine]) {
        match self.inventory.release(lines).await {
            Ok(()) => warn!(lines = lines.len(), "Released reserved stock"),
            Err(err) => error!(error = %err, "Failed to release reserved stock"),
        }
    }

    pub async fn update_order_status(&self, order_id: &str, status: &str) -> Result<(), ServiceError> {
        self.update_order_status_with_deadline(order_id, status, self.default_deadline())
            .await
    }

    /// Moves an order to `status`, restocking its items when it gets cancelled.
    ///
    /// Completed and cancelled are terminal. Re-applying the current status succeeds
    /// and changes nothing, which makes a repeated cancel safe.
    ///
    /// If restocking a cancelled order fails, the previous status is written back. If
    /// that write fails too, the order stays cancelled without its stock returned and
    /// the error message starts with [`UNRESTOCKED_CANCEL`] so callers can reconcile it.
    #[instrument(skip(self, deadline))]
    pub async fn update_order_status_with_deadline(
        &self,
        order_id: &str,
        status: &str,
        deadline: Deadline,
    ) -> Result<(), ServiceError> {
        let target: OrderStatus = status.parse()?;

        deadline.check("status transition")?;
        let previous = self.orders.transition(order_id, target).await?;

        if target == OrderStatus::Cancelled && previous != OrderStatus::Cancelled {
            if let Err(err) = self.restock(order_id).await {
                error!(error = %err, "Restock failed, restoring previous status");
                if let Err(revert) = self.orders.update_status(order_id, previous).await {
                    error!(error = %revert, "Failed to restore previous status");
                    return Err(ServiceError::Internal(format!(
                        "{}: order {} is cancelled but its stock was not returned ({}; revert: {})",
                        UNRESTOCKED_CANCEL, order_id, err, revert
                    )));
                }
                return Err(ServiceError::Internal(err.to_string()));
            }
        }

        info!(%previous, current = %target, "Order status updated");
        Ok(())
    }

    async fn restock(&self, order_id: &str) -> Result<(), ServiceError> {
        let order = self.orders.find_by_id(order_id).await?;
        let report = self.inventory.restock(&order.stock_lines()).await?;
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "Some products of the order no longer exist");
        }
        Ok(())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, ServiceError> {
        self.get_order_with_deadline(order_id, self.default_deadline()).await
    }

    /// The order with its items, each carrying the product as it is now.
    #[instrument(skip(self, deadline))]
    pub async fn get_order_with_deadline(
        &self,
        order_id: &str,
        deadline: Deadline,
    ) -> Result<Order, ServiceError> {
        let mut order = deadline.run("order lookup", self.orders.find_by_id(order_id)).await?;
        for item in &mut order.items {
            item.product = match deadline
                .run("product lookup", self.inventory.product(&item.product_id))
                .await
            {
                Ok(product) => Some(product),
                Err(err @ ServiceError::DeadlineExceeded(_)) => return Err(err),
                Err(err) => {
                    warn!(product_id = %item.product_id, error = %err, "Product snapshot unavailable");
                    None
                }
            };
        }
        Ok(order)
    }

    pub async fn list_orders(&self, user_id: Option<&str>) -> Result<Vec<Order>, ServiceError> {
        self.list_orders_with_deadline(user_id, self.default_deadline()).await
    }

    /// Order headers, newest first; all orders when `user_id` is `None`.
    #[instrument(skip(self, deadline))]
    pub async fn list_orders_with_deadline(
        &self,
        user_id: Option<&str>,
        deadline: Deadline,
    ) -> Result<Vec<Order>, ServiceError> {
        match user_id {
            Some(user_id) => deadline.run("order list", self.orders.find_by_user(user_id)).await,
            None => deadline.run("order list", self.orders.find_all()).await,
        }
    }

    pub async fn get_orders_by_user_id(&self, user_id: &str) -> Result<Vec<Order>, ServiceError> {
        self.list_orders(Some(user_id)).await
    }

    pub async fn get_all_orders(&self) -> Result<Vec<Order>, ServiceError> {
        self.list_orders(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::clients::{OrderClient, ProductClient};
    use crate::domain::{ProductCreate, Reservation};
    use crate::order_actor::OrderError;
    use crate::product_actor::ProductError;
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    fn product_client() -> ProductClient {
        let (actor, inner) = ResourceActor::new(16, || uuid::Uuid::new_v4().to_string());
        tokio::spawn(actor.run());
        ProductClient::new(inner)
    }

    fn order_client() -> OrderClient {
        let (actor, inner) = ResourceActor::new(16, || uuid::Uuid::new_v4().to_string());
        tokio::spawn(actor.run());
        OrderClient::new(inner)
    }

    async fn add_product(products: &ProductClient, price: Decimal, stock: u32) -> String {
        products
            .create(ProductCreate {
                name: "Ramen".into(),
                price,
                stock,
            })
            .await
            .unwrap()
    }

    /// Order store whose writes always fail.
    struct BrokenOrders;

    #[async_trait]
    impl OrderRepository for BrokenOrders {
        async fn save(&self, _order: OrderCreate) -> Result<String, OrderError> {
            Err(OrderError::DatabaseError("connection reset".into()))
        }
        async fn find_by_id(&self, id: &str) -> Result<Order, OrderError> {
            Err(OrderError::NotFound(id.to_string()))
        }
        async fn find_by_user(&self, _user_id: &str) -> Result<Vec<Order>, OrderError> {
            Ok(Vec::new())
        }
        async fn find_all(&self) -> Result<Vec<Order>, OrderError> {
            Ok(Vec::new())
        }
        async fn update_status(&self, _id: &str, _status: OrderStatus) -> Result<(), OrderError> {
            Err(OrderError::DatabaseError("connection reset".into()))
        }
        async fn transition(&self, id: &str, _target: OrderStatus) -> Result<OrderStatus, OrderError> {
            Err(OrderError::NotFound(id.to_string()))
        }
    }

    /// Catalog that cannot take stock back.
    struct NoReleaseProducts(ProductClient);

    #[async_trait]
    impl ProductRepository for NoReleaseProducts {
        async fn create(&self, params: ProductCreate) -> Result<String, ProductError> {
            self.0.create(params).await
        }
        async fn get(&self, id: &str) -> Result<crate::domain::Product, ProductError> {
            self.0.get(id).await
        }
        async fn list(
            &self,
            filter: crate::domain::ProductFilter,
            page: crate::domain::Page,
        ) -> Result<crate::domain::ProductPage, ProductError> {
            self.0.list(filter, page).await
        }
        async fn update(
            &self,
            id: &str,
            patch: crate::domain::ProductPatch,
        ) -> Result<crate::domain::Product, ProductError> {
            self.0.update(id, patch).await
        }
        async fn delete(&self, id: &str) -> Result<(), ProductError> {
            self.0.delete(id).await
        }
        async fn set_stock(&self, id: &str, stock: u32) -> Result<(), ProductError> {
            self.0.set_stock(id, stock).await
        }
        async fn adjust_stock(&self, id: &str, delta: i64) -> Result<u32, ProductError> {
            self.0.adjust_stock(id, delta).await
        }
        async fn reserve(&self, lines: &[StockLine]) -> Result<Vec<Reservation>, ProductError> {
            self.0.reserve(lines).await
        }
        async fn release(&self, _lines: &[StockLine]) -> Result<(), ProductError> {
            Err(ProductError::DatabaseError("read-only replica".into()))
        }
    }

    /// Order store that cannot overwrite a status.
    struct NoRevertOrders(OrderClient);

    #[async_trait]
    impl OrderRepository for NoRevertOrders {
        async fn save(&self, order: OrderCreate) -> Result<String, OrderError> {
            self.0.save(order).await
        }
        async fn find_by_id(&self, id: &str) -> Result<Order, OrderError> {
            self.0.find_by_id(id).await
        }
        async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
            self.0.find_by_user(user_id).await
        }
        async fn find_all(&self) -> Result<Vec<Order>, OrderError> {
            self.0.find_all().await
        }
        async fn update_status(&self, _id: &str, _status: OrderStatus) -> Result<(), OrderError> {
            Err(OrderError::DatabaseError("connection reset".into()))
        }
        async fn transition(&self, id: &str, target: OrderStatus) -> Result<OrderStatus, OrderError> {
            self.0.transition(id, target).await
        }
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        let empty = OrderRequest::new("user_1");
        assert!(matches!(validate(&empty), Err(ServiceError::InvalidArgument(_))));

        let zero = OrderRequest::new("user_1").item("p1", 2).item("p2", 0);
        assert!(matches!(validate(&zero), Err(ServiceError::InvalidArgument(_))));

        let negative = OrderRequest::new("user_1").item("p1", -3);
        assert!(matches!(validate(&negative), Err(ServiceError::InvalidArgument(_))));

        let huge = OrderRequest::new("user_1").item("p1", i64::from(u32::MAX) + 1);
        assert!(matches!(validate(&huge), Err(ServiceError::InvalidArgument(_))));

        let anonymous = OrderRequest::new(" ").item("p1", 1);
        assert!(matches!(validate(&anonymous), Err(ServiceError::InvalidArgument(_))));

        let ok = OrderRequest::new("user_1").item("p1", 2);
        assert_eq!(validate(&ok).unwrap(), vec![StockLine::new("p1", 2)]);
    }

    #[tokio::test]
    async fn test_failed_save_releases_reserved_stock() {
        let products = product_client();
        let pid = add_product(&products, Decimal::from(5), 10).await;
        let service = OrderService::new(Arc::new(BrokenOrders), Arc::new(products.clone()));

        let err = service
            .create_order(OrderRequest::new("user_1").item(pid.clone(), 3))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(products.check_stock(&pid).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_price_is_frozen_at_creation() {
        let products = product_client();
        let orders = order_client();
        let pid = add_product(&products, Decimal::new(450, 2), 10).await;
        let service = OrderService::new(Arc::new(orders), Arc::new(products.clone()));

        let order_id = service
            .create_order(OrderRequest::new("user_1").item(pid.clone(), 2))
            .await
            .unwrap();
        let patch = crate::domain::ProductPatch {
            price: Some(Decimal::from(100)),
            ..Default::default()
        };
        products.update(&pid, patch).await.unwrap();

        let order = service.get_order(&order_id).await.unwrap();
        assert_eq!(order.total_price, Decimal::from(9));
        assert_eq!(order.items[0].price, Decimal::new(450, 2));
        let snapshot = order.items[0].product.as_ref().unwrap();
        assert_eq!(snapshot.price, Decimal::from(100));
        assert_eq!(snapshot.stock, 8);
    }

    #[tokio::test]
    async fn test_failed_restock_restores_status() {
        let products = product_client();
        let orders = order_client();
        let pid = add_product(&products, Decimal::ONE, 5).await;
        let service = OrderService::new(
            Arc::new(orders.clone()),
            Arc::new(NoReleaseProducts(products.clone())),
        );

        let order_id = service
            .create_order(OrderRequest::new("user_1").item(pid.clone(), 2))
            .await
            .unwrap();
        let err = service
            .update_order_status(&order_id, "cancelled")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));

        let order = orders.find_by_id(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(products.check_stock(&pid).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_expired_deadline_leaves_no_trace() {
        let products = product_client();
        let orders = order_client();
        let pid = add_product(&products, Decimal::ONE, 5).await;
        let service = OrderService::new(Arc::new(orders.clone()), Arc::new(products.clone()));

        let err = service
            .create_order_with_deadline(
                OrderRequest::new("user_1").item(pid.clone(), 2),
                Deadline::after(Duration::ZERO),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DeadlineExceeded(_)));
        assert_eq!(products.check_stock(&pid).await.unwrap(), 5);
        assert!(orders.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_product_has_no_snapshot() {
        let products = product_client();
        let orders = order_client();
        let pid = add_product(&products, Decimal::ONE, 5).await;
        let service = OrderService::new(Arc::new(orders), Arc::new(products.clone()));

        let order_id = service
            .create_order(OrderRequest::new("user_1").item(pid.clone(), 1))
            .await
            .unwrap();
        products.delete(&pid).await.unwrap();

        let order = service.get_order(&order_id).await.unwrap();
        assert_eq!(order.items.len(), 1);
        assert!(order.items[0].product.is_none());

        // Cancelling still succeeds; the missing product is skipped
        service.update_order_status(&order_id, "cancelled").await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_restock_and_revert_is_reported() {
        let products = product_client();
        let orders = order_client();
        let pid = add_product(&products, Decimal::ONE, 5).await;
        let service = OrderService::new(
            Arc::new(NoRevertOrders(orders.clone())),
            Arc::new(NoReleaseProducts(products.clone())),
        );

        let order_id = service
            .create_order(OrderRequest::new("user_1").item(pid.clone(), 2))
            .await
            .unwrap();
        let err = service
            .update_order_status(&order_id, "cancelled")
            .await
            .unwrap_err();
        match err {
            ServiceError::Internal(message) => {
                assert!(message.starts_with(UNRESTOCKED_CANCEL), "got {}", message);
                assert!(message.contains(&order_id));
            }
            other => panic!("expected Internal, got {:?}", other),
        }

        let order = orders.find_by_id(&order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(products.check_stock(&pid).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_total_overflow_releases_stock() {
        let products = product_client();
        let orders = order_client();
        let huge = add_product(&products, Decimal::from_i128_with_scale(10i128.pow(28), 0), 200).await;
        let service = OrderService::new(Arc::new(orders.clone()), Arc::new(products.clone()));

        let err = service
            .create_order(OrderRequest::new("user_1").item(huge.clone(), 100))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)), "got {:?}", err);
        assert_eq!(products.check_stock(&huge).await.unwrap(), 200);
        assert!(orders.find_all().await.unwrap().is_empty());
    }
}
