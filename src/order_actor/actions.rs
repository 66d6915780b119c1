use crate::domain::OrderStatus;

/// Custom actions for Order entities.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Moves the order to the target status if the lifecycle allows it.
    ///
    /// Reading the current status and writing the new one happen in one actor turn,
    /// so exactly one of several concurrent callers observes a given previous status.
    Transition(OrderStatus),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderActionResult {
    Transitioned {
        previous: OrderStatus,
        current: OrderStatus,
    },
}
