use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    database::{CatalogStore, connection},
    error::Result,
    models::{Color, Product},
    queries::{color_queries, products_queries},
    services::filter::ProductFilter,
};

/// Catalog backed by the Postgres schema in `migrations/`.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalog {
    async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        products_queries::search_products(&self.pool, filter).await
    }

    async fn find_product(&self, id: i32) -> Result<Option<Product>> {
        products_queries::find_by_id(&self.pool, id).await
    }

    async fn find_products_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, Product>> {
        products_queries::find_by_ids(&self.pool, ids).await
    }

    async fn related_products(&self, product: &Product) -> Result<Vec<Product>> {
        products_queries::find_related(&self.pool, product).await
    }

    async fn all_colors(&self) -> Result<Vec<Color>> {
        color_queries::get_all(&self.pool).await
    }

    async fn find_colors_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, Color>> {
        color_queries::find_by_ids(&self.pool, ids).await
    }

    async fn ping(&self) -> Result<()> {
        connection::check_health(&self.pool).await
    }
}
