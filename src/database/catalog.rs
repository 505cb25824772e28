use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{Color, Product},
    services::filter::ProductFilter,
};

/// Read-only view of the product catalog.
///
/// Every product returned is fully hydrated with its colors and images, and
/// sequences are ordered by ascending id.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;

    async fn find_product(&self, id: i32) -> Result<Option<Product>>;

    /// Looks up several products at once. Ids with no product are absent
    /// from the returned map.
    async fn find_products_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, Product>>;

    /// Products in the same category as `product`, excluding it.
    async fn related_products(&self, product: &Product) -> Result<Vec<Product>>;

    async fn all_colors(&self) -> Result<Vec<Color>>;

    async fn find_colors_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, Color>>;

    /// Readiness probe for the backing store.
    async fn ping(&self) -> Result<()>;
}
