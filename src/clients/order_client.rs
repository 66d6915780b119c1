use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Order, OrderCreate, OrderFilter, OrderStatus};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};
use crate::repository::{sort_newest_first, OrderRepository};

/// Client for interacting with the Order actor.
///
/// Orders are written whole: the header and every item travel in one create request.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

crate::impl_basic_client!(OrderClient, Order, OrderError, order);

impl OrderClient {
    async fn headers(&self, filter: OrderFilter) -> Result<Vec<Order>, OrderError> {
        let mut orders: Vec<Order> = self
            .inner
            .list(filter)
            .await?
            .iter()
            .map(Order::header)
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }
}

#[async_trait]
impl OrderRepository for OrderClient {
    #[instrument(skip(self, order), fields(user_id = %order.user_id, items = order.items.len()))]
    async fn save(&self, order: OrderCreate) -> Result<String, OrderError> {
        debug!("Sending request");
        self.inner.create(order).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Order, OrderError> {
        self.fetch_order(id).await
    }

    #[instrument(skip(self))]
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        self.headers(OrderFilter {
            user_id: Some(user_id.to_string()),
        })
        .await
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        self.headers(OrderFilter::default()).await
    }

    #[instrument(skip(self))]
    async fn update_status(&self, id: &str, status: OrderStatus) -> Result<(), OrderError> {
        debug!("Sending request");
        self.inner.update(id.to_string(), status).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn transition(&self, id: &str, target: OrderStatus) -> Result<OrderStatus, OrderError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id.to_string(), OrderAction::Transition(target))
            .await?
        {
            OrderActionResult::Transitioned { previous, .. } => Ok(previous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::Entity;
    use crate::domain::NewOrderItem;
    use crate::mock_framework::{create_mock_client, expect_action, expect_create, expect_list};
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_save_sends_header_and_items_in_one_request() {
        let (inner, mut receiver) = create_mock_client::<Order>(4);
        let client = OrderClient::new(inner);

        let task = tokio::spawn(async move {
            client
                .save(
                    OrderCreate::new(
                        "user_1",
                        vec![
                            NewOrderItem { product_id: "p1".into(), quantity: 2, price: Decimal::ONE },
                            NewOrderItem { product_id: "p2".into(), quantity: 1, price: Decimal::TEN },
                        ],
                    )
                    .unwrap(),
                )
                .await
        });

        let (params, responder) = expect_create(&mut receiver).await.expect("Expected Order Create");
        assert_eq!(params.user_id, "user_1");
        assert_eq!(params.items.len(), 2);
        assert_eq!(params.total_price, Decimal::from(12));
        responder.send(Ok("order_1".to_string())).unwrap();

        assert_eq!(task.await.unwrap(), Ok("order_1".to_string()));
    }

    #[tokio::test]
    async fn test_transition_returns_previous_status() {
        let (inner, mut receiver) = create_mock_client::<Order>(4);
        let client = OrderClient::new(inner);

        let task = tokio::spawn(async move { client.transition("order_1", OrderStatus::Cancelled).await });

        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Order Action");
        assert_eq!(id, "order_1");
        assert_eq!(action, OrderAction::Transition(OrderStatus::Cancelled));
        responder
            .send(Ok(OrderActionResult::Transitioned {
                previous: OrderStatus::Pending,
                current: OrderStatus::Cancelled,
            }))
            .unwrap();

        assert_eq!(task.await.unwrap(), Ok(OrderStatus::Pending));
    }

    #[tokio::test]
    async fn test_find_by_user_returns_headers_only() {
        let (inner, mut receiver) = create_mock_client::<Order>(4);
        let client = OrderClient::new(inner);

        let task = tokio::spawn(async move { client.find_by_user("user_1").await });

        let (filter, responder) = expect_list(&mut receiver).await.expect("Expected Order List");
        assert_eq!(filter.user_id.as_deref(), Some("user_1"));
        let order = Order::from_create_params(
            "order_1".into(),
            OrderCreate::new(
                "user_1",
                vec![NewOrderItem { product_id: "p1".into(), quantity: 4, price: Decimal::ONE }],
            )
            .unwrap(),
        )
        .unwrap();
        responder.send(Ok(vec![order])).unwrap();

        let orders = task.await.unwrap().unwrap();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].items.is_empty());
    }
}
