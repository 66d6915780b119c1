//! Typed clients over the resource actors. Each one implements the matching
//! repository trait so the services never see actor messages.

#[macro_use]
mod macros;
mod order_client;
mod product_client;
mod user_client;

pub use order_client::OrderClient;
pub use product_client::ProductClient;
pub use user_client::UserClient;
