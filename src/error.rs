use thiserror::Error;

use crate::domain::{ParseStatusError, PriceOverflow};
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;

/// Outcome classes the order workflow reports to its caller.
///
/// `NotFound` and `FailedPrecondition` are expected, user-facing results. Any store
/// or plumbing failure is `Internal`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
    #[error("Deadline exceeded: {0}")]
    DeadlineExceeded(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, transport-neutral name of the error class.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::FailedPrecondition(_) => "failed_precondition",
            ServiceError::DeadlineExceeded(_) => "deadline_exceeded",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<ProductError> for ServiceError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => ServiceError::NotFound(format!("product {}", id)),
            err @ ProductError::InsufficientStock { .. } => {
                ServiceError::FailedPrecondition(err.to_string())
            }
            ProductError::InvalidQuantity(msg) | ProductError::ValidationError(msg) => {
                ServiceError::InvalidArgument(msg)
            }
            err => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => ServiceError::NotFound(format!("order {}", id)),
            err @ OrderError::InvalidStatusTransition { .. } => {
                ServiceError::InvalidArgument(err.to_string())
            }
            OrderError::ValidationError(msg) => ServiceError::InvalidArgument(msg),
            err => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<UserError> for ServiceError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => ServiceError::NotFound(format!("user {}", id)),
            UserError::ValidationError(msg) => ServiceError::InvalidArgument(msg),
            err => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<ParseStatusError> for ServiceError {
    fn from(err: ParseStatusError) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

impl From<PriceOverflow> for ServiceError {
    fn from(err: PriceOverflow) -> Self {
        ServiceError::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderStatus;

    #[test]
    fn test_entity_errors_map_to_taxonomy() {
        let shortage = ProductError::InsufficientStock {
            product_id: "p1".into(),
            requested: 5,
            available: 2,
        };
        assert_eq!(ServiceError::from(shortage).code(), "failed_precondition");
        assert_eq!(
            ServiceError::from(ProductError::NotFound("p9".into())),
            ServiceError::NotFound("product p9".into())
        );
        assert_eq!(
            ServiceError::from(ProductError::DatabaseError("disk full".into())).code(),
            "internal"
        );

        let transition = OrderError::InvalidStatusTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        };
        assert_eq!(ServiceError::from(transition).code(), "invalid_argument");
        assert_eq!(
            ServiceError::from(OrderError::ActorCommunicationError("closed".into())).code(),
            "internal"
        );
        assert_eq!(ServiceError::from(UserError::NotFound("u1".into())).code(), "not_found");
    }

    #[test]
    fn test_bad_status_is_invalid_argument() {
        let err = "shipped".parse::<OrderStatus>().unwrap_err();
        assert_eq!(ServiceError::from(err).code(), "invalid_argument");
    }
}
