use crate::domain::Reservation;

/// Custom actions for Product entities.
///
/// These actions represent domain-specific operations that can be performed
/// on a product beyond standard CRUD operations. Each one reads and writes the
/// stock inside a single actor turn, so check and change can never interleave
/// with another request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAction {
    /// Checks the current stock level without modifying it.
    CheckStock,
    /// Takes the given quantity out of stock.
    ///
    /// # Errors
    /// Fails without touching the stock if the requested amount exceeds what is available.
    Reserve(u32),
    /// Puts the given quantity back into stock.
    Release(u32),
    /// Overwrites the stock level.
    SetStock(u32),
    /// Signed adjustment. A result below zero is rejected, never clamped.
    AdjustStock(i64),
}

/// Results from ProductActions.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductActionResult {
    /// Stock level after the action ran.
    StockLevel(u32),
    /// Result from Reserve, including the price at the time of the decrement.
    Reserved(Reservation),
}
