use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::{Product, Reservation, StockLine};
use crate::error::ServiceError;
use crate::product_actor::ProductError;
use crate::repository::ProductRepository;

/// First line that cannot be fulfilled.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortage {
    pub product_id: String,
    pub requested: u32,
    /// `None` when the product does not exist.
    pub available: Option<u32>,
}

impl From<Shortage> for ServiceError {
    fn from(shortage: Shortage) -> Self {
        match shortage.available {
            None => ServiceError::NotFound(format!("product {}", shortage.product_id)),
            Some(available) => ServiceError::FailedPrecondition(format!(
                "insufficient stock for product {}: requested {}, available {}",
                shortage.product_id, shortage.requested, available
            )),
        }
    }
}

/// Availability verdict for a set of lines.
#[derive(Debug, Clone, PartialEq)]
pub enum StockCheck {
    Available,
    Unavailable(Shortage),
}

/// Outcome of returning stock to the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestockReport {
    pub restocked: Vec<StockLine>,
    /// Lines whose product no longer exists.
    pub skipped: Vec<StockLine>,
}

/// Answers availability questions and moves stock on behalf of the order workflow.
#[derive(Clone)]
pub struct InventoryService {
    products: Arc<dyn ProductRepository>,
}

/// Sums quantities of repeated products, keeping first-seen order.
fn merge_lines(lines: &[StockLine]) -> Vec<StockLine> {
    let mut merged: Vec<StockLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|m| m.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line.clone()),
        }
    }
    merged
}

impl InventoryService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn product(&self, id: &str) -> Result<Product, ProductError> {
        self.products.get(id).await
    }

    /// Stops at the first line that is unknown or short of stock.
    ///
    /// The verdict is advisory: stock may change before [`update_stock`](Self::update_stock),
    /// which re-checks every line atomically.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn check_stock(&self, lines: &[StockLine]) -> Result<StockCheck, ProductError> {
        for line in merge_lines(lines) {
            let product = match self.products.get(&line.product_id).await {
                Ok(product) => product,
                Err(ProductError::NotFound(_)) => {
                    debug!(product_id = %line.product_id, "Unknown product");
                    return Ok(StockCheck::Unavailable(Shortage {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available: None,
                    }));
                }
                Err(err) => return Err(err),
            };
            if product.stock < line.quantity {
                debug!(product_id = %line.product_id, stock = product.stock, "Insufficient stock");
                return Ok(StockCheck::Unavailable(Shortage {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: Some(product.stock),
                }));
            }
        }
        Ok(StockCheck::Available)
    }

    /// Decrements every line or none; the reservations carry the unit price at that moment.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn update_stock(&self, lines: &[StockLine]) -> Result<Vec<Reservation>, ProductError> {
        let reservations = self.products.reserve(lines).await?;
        debug!(reserved = reservations.len(), "Stock reserved");
        Ok(reservations)
    }

    /// Returns previously reserved stock in one atomic step.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn release(&self, lines: &[StockLine]) -> Result<(), ProductError> {
        self.products.release(lines).await
    }

    /// Returns stock of a cancelled order.
    ///
    /// Products deleted since the order was placed are skipped; everything else is
    /// released in one atomic step.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn restock(&self, lines: &[StockLine]) -> Result<RestockReport, ProductError> {
        let mut pending = lines.to_vec();
        let mut skipped = Vec::new();
        loop {
            match self.products.release(&pending).await {
                Ok(()) => break,
                Err(ProductError::NotFound(id)) => {
                    let (gone, rest): (Vec<_>, Vec<_>) =
                        pending.into_iter().partition(|line| line.product_id == id);
                    if gone.is_empty() {
                        return Err(ProductError::NotFound(id));
                    }
                    warn!(product_id = %id, "Product no longer exists, skipping restock");
                    skipped.extend(gone);
                    pending = rest;
                }
                Err(err) => return Err(err),
            }
        }
        info!(restocked = pending.len(), skipped = skipped.len(), "Stock returned");
        Ok(RestockReport {
            restocked: pending,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_system::OrderSystem;
    use crate::app_system::SystemConfig;
    use crate::domain::ProductCreate;
    use rust_decimal::Decimal;

    async fn setup(stocks: &[u32]) -> (OrderSystem, Vec<String>) {
        let system = OrderSystem::new(&SystemConfig::default());
        let mut ids = Vec::new();
        for (i, stock) in stocks.iter().enumerate() {
            let id = system
                .product_client
                .create(ProductCreate {
                    name: format!("dish {}", i),
                    price: Decimal::from(5),
                    stock: *stock,
                })
                .await
                .unwrap();
            ids.push(id);
        }
        (system, ids)
    }

    #[tokio::test]
    async fn test_check_stock_short_circuits_on_first_failure() {
        let (system, ids) = setup(&[10, 1, 0]).await;
        let lines = vec![
            StockLine::new(ids[0].clone(), 3),
            StockLine::new(ids[1].clone(), 2),
            StockLine::new(ids[2].clone(), 1),
        ];
        let verdict = system.inventory.check_stock(&lines).await.unwrap();
        assert_eq!(
            verdict,
            StockCheck::Unavailable(Shortage {
                product_id: ids[1].clone(),
                requested: 2,
                available: Some(1),
            })
        );

        let missing = vec![StockLine::new("nope", 1)];
        let verdict = system.inventory.check_stock(&missing).await.unwrap();
        assert!(matches!(
            verdict,
            StockCheck::Unavailable(Shortage { available: None, .. })
        ));

        system.shutdown().await;
    }

    #[tokio::test]
    async fn test_check_stock_counts_repeated_products_together() {
        let (system, ids) = setup(&[4]).await;
        let lines = vec![StockLine::new(ids[0].clone(), 3), StockLine::new(ids[0].clone(), 2)];
        assert!(matches!(
            system.inventory.check_stock(&lines).await.unwrap(),
            StockCheck::Unavailable(Shortage { requested: 5, .. })
        ));
        assert_eq!(
            system.inventory.check_stock(&lines[..1]).await.unwrap(),
            StockCheck::Available
        );
        system.shutdown().await;
    }

    #[tokio::test]
    async fn test_restock_skips_deleted_products() {
        let (system, ids) = setup(&[5, 5]).await;
        let lines = vec![StockLine::new(ids[0].clone(), 2), StockLine::new(ids[1].clone(), 3)];
        system.inventory.update_stock(&lines).await.unwrap();
        system.product_client.delete_product(&ids[0]).await.unwrap();

        let report = system.inventory.restock(&lines).await.unwrap();
        assert_eq!(report.skipped, vec![lines[0].clone()]);
        assert_eq!(report.restocked, vec![lines[1].clone()]);
        assert_eq!(system.product_client.check_stock(&ids[1]).await.unwrap(), 5);

        system.shutdown().await;
    }

    #[test]
    fn test_shortage_maps_to_service_error() {
        let missing = Shortage { product_id: "p1".into(), requested: 1, available: None };
        assert_eq!(ServiceError::from(missing).code(), "not_found");
        let short = Shortage { product_id: "p1".into(), requested: 5, available: Some(2) };
        assert_eq!(ServiceError::from(short).code(), "failed_precondition");
    }
}
