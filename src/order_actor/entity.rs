use chrono::Utc;
use uuid::Uuid;

use crate::actor_framework::Entity;
use crate::domain::{Order, OrderCreate, OrderFilter, OrderItem, OrderStatus};
use super::actions::{OrderAction, OrderActionResult};
use super::error::OrderError;

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    /// Orders only ever change status; a patch overwrites it without lifecycle checks.
    type Patch = OrderStatus;
    type Filter = OrderFilter;
    type Action = OrderAction;
    type ActionResult = OrderActionResult;
    type Error = OrderError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order, together with all of its items, from creation parameters.
    ///
    /// # Notes
    /// The order starts as `pending` with the total carried by the payload, and the
    /// item ids and creation timestamp are assigned here. Either the whole order is
    /// stored or nothing is.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        if params.user_id.trim().is_empty() {
            return Err(OrderError::ValidationError("user id must not be empty".into()));
        }
        if params.items.is_empty() {
            return Err(OrderError::ValidationError("order must have at least one item".into()));
        }
        if let Some(item) = params.items.iter().find(|item| item.quantity == 0) {
            return Err(OrderError::ValidationError(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }

        let items = params
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: id.clone(),
                product_id: item.product_id,
                product: None,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();

        Ok(Self {
            id,
            user_id: params.user_id,
            total_price: params.total_price,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            items,
        })
    }

    fn on_update(&mut self, status: OrderStatus) -> Result<(), OrderError> {
        self.status = status;
        Ok(())
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        filter
            .user_id
            .as_deref()
            .map_or(true, |user_id| self.user_id == user_id)
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, OrderError> {
        match action {
            OrderAction::Transition(target) => {
                let previous = self.status;
                if !previous.can_transition_to(target) {
                    return Err(OrderError::InvalidStatusTransition {
                        from: previous,
                        to: target,
                    });
                }
                self.status = target;
                Ok(OrderActionResult::Transitioned {
                    previous,
                    current: target,
                })
            }
        }
    }
}
