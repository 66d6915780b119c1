use rust_decimal::Decimal;

use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductFilter, ProductPatch, Reservation};
use super::actions::{ProductAction, ProductActionResult};
use super::error::ProductError;

fn validate_name(name: &str) -> Result<(), ProductError> {
    if name.trim().is_empty() {
        return Err(ProductError::ValidationError("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), ProductError> {
    if price < Decimal::ZERO {
        return Err(ProductError::ValidationError(format!("price must not be negative: {}", price)));
    }
    Ok(())
}

impl Entity for Product {
    type Id = String;
    type CreateParams = ProductCreate;
    type Patch = ProductPatch;
    type Filter = ProductFilter;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Product from creation parameters.
    ///
    /// # Arguments
    /// * `id` - Unique identifier for the product
    /// * `params` - Product creation parameters containing name, price, and stock
    fn from_create_params(id: String, params: ProductCreate) -> Result<Self, ProductError> {
        validate_name(&params.name)?;
        validate_price(params.price)?;
        Ok(Self {
            id,
            name: params.name,
            price: params.price,
            stock: params.stock,
        })
    }

    /// Updates the product's name, price and/or stock.
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(name) = patch.name {
            validate_name(&name)?;
            self.name = name;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            self.price = price;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        Ok(())
    }

    fn matches(&self, filter: &ProductFilter) -> bool {
        filter.matches(self)
    }

    /// Handles product-specific actions.
    ///
    /// # Errors
    /// Returns an error if attempting to reserve more stock than available, or if an
    /// adjustment would leave the stock negative or beyond `u32::MAX`.
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::StockLevel(self.stock)),
            ProductAction::Reserve(amount) => {
                if amount == 0 {
                    return Err(ProductError::InvalidQuantity("reserved quantity must be positive".into()));
                }
                if self.stock < amount {
                    return Err(ProductError::InsufficientStock {
                        product_id: self.id.clone(),
                        requested: amount,
                        available: self.stock,
                    });
                }
                self.stock -= amount;
                Ok(ProductActionResult::Reserved(Reservation {
                    product_id: self.id.clone(),
                    quantity: amount,
                    unit_price: self.price,
                    remaining: self.stock,
                }))
            }
            ProductAction::Release(amount) => {
                self.stock = self.stock.checked_add(amount).ok_or_else(|| {
                    ProductError::InvalidQuantity(format!("stock overflow releasing {}", amount))
                })?;
                Ok(ProductActionResult::StockLevel(self.stock))
            }
            ProductAction::SetStock(stock) => {
                self.stock = stock;
                Ok(ProductActionResult::StockLevel(self.stock))
            }
            ProductAction::AdjustStock(delta) => {
                let adjusted = i64::from(self.stock) + delta;
                if adjusted < 0 {
                    return Err(ProductError::InsufficientStock {
                        product_id: self.id.clone(),
                        requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
                        available: self.stock,
                    });
                }
                self.stock = u32::try_from(adjusted).map_err(|_| {
                    ProductError::InvalidQuantity(format!("stock overflow adjusting by {}", delta))
                })?;
                Ok(ProductActionResult::StockLevel(self.stock))
            }
        }
    }
}
