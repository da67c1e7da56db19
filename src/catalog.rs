//! Product catalog persistence and the snapshot reads the validator uses.
//!
//! The catalog owns product identity and pricing. Stock quantities live on
//! the product record but are mutated only by the ledger executor as a side
//! effect of a committed transaction.

use sled::{Db, Tree};

use crate::error::LedgerError;
use crate::types::Money;
use crate::utils;

pub const PRODUCTS_TREE: &str = "products";

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Product {
    #[n(0)]
    pub id: String, // bech32, "prod_" prefix
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub sku: String,
    #[n(3)]
    pub supplier_id: Option<String>,
    #[n(4)]
    pub cost_price: Money,
    #[n(5)]
    pub sale_price: Money,
    #[n(6)]
    pub quantity_in_stock: u32,
    #[n(7)]
    pub low_stock_threshold: u32,
}

impl Product {
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.id.clone(),
            quantity_in_stock: self.quantity_in_stock,
            cost_price: self.cost_price,
            sale_price: self.sale_price,
        }
    }
}

/// One product's stock and prices as read at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub product_id: String,
    pub quantity_in_stock: u32,
    pub cost_price: Money,
    pub sale_price: Money,
}

// Used for registering new products; the ID is minted on insert.
#[derive(Debug, Default, Clone)]
pub struct ProductDraft {
    name: Option<String>,
    sku: Option<String>,
    supplier_id: Option<String>,
    cost_price: Money,
    sale_price: Money,
    quantity_in_stock: u32,
    low_stock_threshold: u32,
}

impl ProductDraft {
    /// Construct a new builder object, the basis for a catalog entry
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }
    pub fn set_sku(mut self, sku: &str) -> Self {
        self.sku = Some(sku.to_owned());
        self
    }
    pub fn set_supplier(mut self, supplier_id: &str) -> Self {
        self.supplier_id = Some(supplier_id.to_owned());
        self
    }
    pub fn set_cost_price(mut self, cost_price: Money) -> Self {
        self.cost_price = cost_price;
        self
    }
    pub fn set_sale_price(mut self, sale_price: Money) -> Self {
        self.sale_price = sale_price;
        self
    }
    pub fn set_initial_stock(mut self, quantity: u32) -> Self {
        self.quantity_in_stock = quantity;
        self
    }
    pub fn set_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    // Checks fields, then mints the id and produces the persistable record
    fn validate_and_finalise(self) -> Result<Product, LedgerError> {
        let Some(name) = self.name.filter(|n| !n.trim().is_empty()) else {
            return Err(anyhow::Error::msg("product name is not set").into());
        };
        let Some(sku) = self.sku.filter(|s| !s.trim().is_empty()) else {
            return Err(anyhow::Error::msg("product sku is not set").into());
        };
        if self.cost_price.is_negative() {
            return Err(LedgerError::InvalidAmount {
                product_id: sku.clone(),
            });
        }
        if self.sale_price.is_negative() {
            return Err(LedgerError::InvalidAmount {
                product_id: sku.clone(),
            });
        }

        let id = utils::new_uuid_to_bech32("prod_")?;

        Ok(Product {
            id,
            name,
            sku,
            supplier_id: self.supplier_id,
            cost_price: self.cost_price,
            sale_price: self.sale_price,
            quantity_in_stock: self.quantity_in_stock,
            low_stock_threshold: self.low_stock_threshold,
        })
    }
}

pub struct CatalogStore {
    tree: Tree,
}

impl CatalogStore {
    pub fn new(db: &Db) -> Result<Self, LedgerError> {
        Ok(Self {
            tree: db.open_tree(PRODUCTS_TREE)?,
        })
    }

    /// Register a new product and return the persisted record.
    pub fn insert(&self, draft: ProductDraft) -> Result<Product, LedgerError> {
        let product = draft.validate_and_finalise()?;
        self.tree
            .insert(product.id.as_bytes(), utils::to_cbor(&product)?)?;
        Ok(product)
    }

    pub fn get(&self, product_id: &str) -> Result<Option<Product>, LedgerError> {
        let Some(bytes) = self.tree.get(product_id.as_bytes())? else {
            return Ok(None);
        };
        Ok(Some(utils::from_cbor(&bytes)?))
    }

    /// What the validator reads: stock and prices as of this call.
    pub fn snapshot(&self, product_id: &str) -> Result<Option<ProductSnapshot>, LedgerError> {
        Ok(self.get(product_id)?.map(|product| product.snapshot()))
    }

    /// All products, ordered by name.
    pub fn list(&self) -> Result<Vec<Product>, LedgerError> {
        let mut products = Vec::new();
        for entry in self.tree.iter() {
            let (_, value) = entry?;
            products.push(utils::from_cbor::<Product>(&value)?);
        }
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    /// Catalog price maintenance. Stock is not touched here: it moves only
    /// through committed transactions, and committed lines keep the prices
    /// they captured regardless of what happens here.
    pub fn update_prices(
        &self,
        product_id: &str,
        cost_price: Money,
        sale_price: Money,
    ) -> Result<Product, LedgerError> {
        if cost_price.is_negative() || sale_price.is_negative() {
            return Err(LedgerError::InvalidAmount {
                product_id: product_id.to_owned(),
            });
        }
        let Some(mut product) = self.get(product_id)? else {
            return Err(LedgerError::UnknownProduct {
                product_id: product_id.to_owned(),
            });
        };

        product.cost_price = cost_price;
        product.sale_price = sale_price;
        self.tree
            .insert(product.id.as_bytes(), utils::to_cbor(&product)?)?;
        Ok(product)
    }
}
