//! Workflow layer: inventory availability and the order lifecycle.

mod deadline;
mod inventory;
mod orders;

pub use deadline::Deadline;
pub use inventory::{InventoryService, RestockReport, Shortage, StockCheck};
pub use orders::{OrderService, UNRESTOCKED_CANCEL};
