use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
        }
    }
}

/// Payload for creating a new product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
}

/// Payload for updating an existing product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
}

/// Catalog search criteria. Unset fields do not restrict the result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self.name.as_deref().map_or(true, |needle| {
            product.name.to_lowercase().contains(&needle.to_lowercase())
        });
        let min_ok = self.min_price.map_or(true, |min| product.price >= min);
        let max_ok = self.max_price.map_or(true, |max| product.price <= max);
        name_ok && min_ok && max_ok
    }
}

pub const DEFAULT_PER_PAGE: u32 = 10;

/// One-based pagination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Page {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }.normalized()
    }

    /// Zero values fall back to the first page and the default page size.
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: if self.per_page == 0 {
                DEFAULT_PER_PAGE
            } else {
                self.per_page
            },
        }
    }

    pub fn offset(&self) -> usize {
        let page = self.normalized();
        (page.page as usize - 1) * page.per_page as usize
    }
}

/// A page of catalog results plus the number of products matching the filter overall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// A quantity of one product, as requested by an order or returned on cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub product_id: String,
    pub quantity: u32,
}

impl StockLine {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Outcome of an atomic stock decrement for one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub product_id: String,
    pub quantity: u32,
    /// Product price at the moment the stock was taken.
    pub unit_price: Decimal,
    pub remaining: u32,
}
