//! User-specific domain logic: validation and uniqueness of username and email.

pub mod entity;
pub mod error;

pub use error::*;
