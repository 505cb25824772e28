use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    database::CatalogStore,
    error::{AppError, Result},
    models::{Color, Product},
    services::filter::ProductFilter,
};

/// JSON layout accepted by [`MemoryCatalog::load_seed_file`].
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Default)]
struct CatalogData {
    products: BTreeMap<i32, Product>,
    colors: BTreeMap<i32, Color>,
}

/// Process-local catalog evaluating [`ProductFilter`] in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    data: RwLock<CatalogData>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a seed, rejecting products whose prices the
    /// database schema would refuse.
    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        for product in &seed.products {
            check_prices(product)?;
        }

        let catalog = Self::new();
        for color in seed.colors {
            catalog.insert_color(color);
        }
        for product in seed.products {
            catalog.insert_product(product);
        }
        Ok(catalog)
    }

    pub async fn load_seed_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::ConfigError(format!("Cannot read catalog seed {}: {}", path.display(), e))
        })?;

        let seed: CatalogSeed = serde_json::from_str(&raw).map_err(|e| {
            AppError::ConfigError(format!("Invalid catalog seed {}: {}", path.display(), e))
        })?;

        let catalog = Self::from_seed(seed).map_err(|e| {
            AppError::ConfigError(format!("Invalid catalog seed {}: {}", path.display(), e))
        })?;
        tracing::info!(
            "Loaded {} products from {}",
            catalog.data.read().products.len(),
            path.display()
        );

        Ok(catalog)
    }

    pub fn insert_color(&self, color: Color) {
        self.data.write().colors.insert(color.id, color);
    }

    /// Stores a product, registering any colors it references.
    pub fn insert_product(&self, product: Product) {
        let mut data = self.data.write();
        for color in &product.colors {
            data.colors.entry(color.id).or_insert_with(|| color.clone());
        }
        data.products.insert(product.id, product);
    }

    /// Deletes a product together with its images.
    pub fn remove_product(&self, id: i32) -> Option<Product> {
        self.data.write().products.remove(&id)
    }
}

fn check_prices(product: &Product) -> Result<()> {
    if product.original_price < Decimal::ZERO {
        return Err(AppError::ConfigError(format!(
            "product {} has a negative original price",
            product.id
        )));
    }

    if let Some(discounted) = product.discounted_price {
        if discounted < Decimal::ZERO || discounted > product.original_price {
            return Err(AppError::ConfigError(format!(
                "product {} has discounted price {} outside 0..={}",
                product.id, discounted, product.original_price
            )));
        }
    }

    Ok(())
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let data = self.data.read();
        Ok(data
            .products
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect())
    }

    async fn find_product(&self, id: i32) -> Result<Option<Product>> {
        Ok(self.data.read().products.get(&id).cloned())
    }

    async fn find_products_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, Product>> {
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.products.get(id))
            .map(|product| (product.id, product.clone()))
            .collect())
    }

    async fn related_products(&self, product: &Product) -> Result<Vec<Product>> {
        let data = self.data.read();
        Ok(data
            .products
            .values()
            .filter(|other| other.id != product.id && other.category == product.category)
            .cloned()
            .collect())
    }

    async fn all_colors(&self) -> Result<Vec<Color>> {
        Ok(self.data.read().colors.values().cloned().collect())
    }

    async fn find_colors_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, Color>> {
        let data = self.data.read();
        Ok(ids
            .iter()
            .filter_map(|id| data.colors.get(id))
            .map(|color| (color.id, color.clone()))
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
