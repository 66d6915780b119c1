//! Food ordering core: order lifecycle on top of a product catalog with atomic stock.
//!
//! Every store is owned by one resource actor; the workflow in [`services`] talks to the
//! stores only through the traits in [`repository`].

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod error;
pub mod order_actor;
pub mod product_actor;
pub mod repository;
pub mod services;
pub mod user_actor;

#[cfg(test)]
mod mock_framework;

pub use error::ServiceError;
