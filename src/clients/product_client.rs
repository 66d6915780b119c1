use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Page, Product, ProductCreate, ProductFilter, ProductPage, ProductPatch, Reservation, StockLine};
use crate::product_actor::{ProductAction, ProductActionResult, ProductError};
use crate::repository::{paginate, ProductRepository};

/// Client for interacting with the Product actor.
#[derive(Clone)]
pub struct ProductClient {
    inner: ResourceClient<Product>,
}

crate::impl_basic_client!(ProductClient, Product, ProductError, product);

fn unexpected(result: ProductActionResult) -> ProductError {
    ProductError::ActorCommunicationError(format!("Unexpected result: {:?}", result))
}

impl ProductClient {
    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: &str) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id.to_string(), ProductAction::CheckStock).await? {
            ProductActionResult::StockLevel(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    async fn stock_action(&self, id: &str, action: ProductAction) -> Result<u32, ProductError> {
        match self.inner.perform_action(id.to_string(), action).await? {
            ProductActionResult::StockLevel(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }
}

#[async_trait]
impl ProductRepository for ProductClient {
    #[instrument(skip(self, params), fields(name = %params.name))]
    async fn create(&self, params: ProductCreate) -> Result<String, ProductError> {
        debug!("Sending request");
        self.inner.create(params).await
    }

    async fn get(&self, id: &str) -> Result<Product, ProductError> {
        self.fetch_product(id).await
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: ProductFilter, page: Page) -> Result<ProductPage, ProductError> {
        debug!("Sending request");
        let products = self.inner.list(filter).await?;
        Ok(paginate(products, page))
    }

    #[instrument(skip(self))]
    async fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner.update(id.to_string(), patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), ProductError> {
        self.delete_product(id).await
    }

    #[instrument(skip(self))]
    async fn set_stock(&self, id: &str, stock: u32) -> Result<(), ProductError> {
        debug!("Sending request");
        self.stock_action(id, ProductAction::SetStock(stock)).await.map(|_| ())
    }

    #[instrument(skip(self))]
    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<u32, ProductError> {
        debug!("Sending request");
        self.stock_action(id, ProductAction::AdjustStock(delta)).await
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn reserve(&self, lines: &[StockLine]) -> Result<Vec<Reservation>, ProductError> {
        debug!("Sending request");
        if lines.is_empty() {
            return Ok(Vec::new());
        }
        let steps = lines
            .iter()
            .map(|line| (line.product_id.clone(), ProductAction::Reserve(line.quantity)))
            .collect();
        self.inner
            .transaction(steps)
            .await?
            .into_iter()
            .map(|result| match result {
                ProductActionResult::Reserved(reservation) => Ok(reservation),
                other => Err(unexpected(other)),
            })
            .collect()
    }

    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    async fn release(&self, lines: &[StockLine]) -> Result<(), ProductError> {
        debug!("Sending request");
        if lines.is_empty() {
            return Ok(());
        }
        let steps = lines
            .iter()
            .map(|line| (line.product_id.clone(), ProductAction::Release(line.quantity)))
            .collect();
        self.inner.transaction(steps).await.map(|_| ())
    }
}
