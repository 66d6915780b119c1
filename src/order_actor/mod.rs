//! Order-specific domain logic: atomic save of header plus items, and status transitions.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
