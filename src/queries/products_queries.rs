use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    error::Result,
    models::{Category, Color, Product, ProductImage, ProductTag},
    services::filter::{Facet, ProductFilter},
};

const PRODUCT_COLUMNS: &str = "id, name, original_price, discounted_price, category, tags, \
     features, materials, measurements, is_in_stock, delivery_availability";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    original_price: Decimal,
    discounted_price: Option<Decimal>,
    category: String,
    tags: Vec<String>,
    features: String,
    materials: String,
    measurements: String,
    is_in_stock: bool,
    delivery_availability: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductColorRow {
    product_id: i32,
    id: i32,
    name: String,
    image: Option<String>,
}

impl ProductRow {
    fn into_product(self, colors: Vec<Color>, images: Vec<ProductImage>) -> Product {
        let category = match self.category.as_str() {
            "" => None,
            raw => raw.parse::<Category>().ok().or_else(|| {
                tracing::warn!("Product {} has unknown category {:?}", self.id, raw);
                None
            }),
        };

        let tags: BTreeSet<ProductTag> = self
            .tags
            .iter()
            .filter_map(|raw| match raw.parse::<ProductTag>() {
                Ok(tag) => Some(tag),
                Err(_) => {
                    tracing::warn!("Product {} has unknown tag {:?}", self.id, raw);
                    None
                }
            })
            .collect();

        Product {
            id: self.id,
            name: self.name,
            original_price: self.original_price,
            discounted_price: self.discounted_price,
            category,
            tags,
            features: self.features,
            materials: self.materials,
            measurements: self.measurements,
            is_in_stock: self.is_in_stock,
            delivery_availability: self.delivery_availability,
            colors,
            images,
        }
    }
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE id = $1",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(hydrate(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn find_by_ids(pool: &PgPool, ids: &[i32]) -> Result<HashMap<i32, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE id = ANY($1) ORDER BY id",
        PRODUCT_COLUMNS
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let products = hydrate(pool, rows).await?;

    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Products sharing the product's category, excluding the product itself.
pub async fn find_related(pool: &PgPool, product: &Product) -> Result<Vec<Product>> {
    let category = product.category.map(Category::as_str).unwrap_or("");

    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products WHERE category = $1 AND id <> $2 ORDER BY id",
        PRODUCT_COLUMNS
    ))
    .bind(category)
    .bind(product.id)
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

pub async fn search_products(pool: &PgPool, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM products WHERE 1=1",
        PRODUCT_COLUMNS
    ));

    push_filter(&mut query, filter);

    query.push(" ORDER BY id ASC");

    let rows = query.build_query_as::<ProductRow>().fetch_all(pool).await?;

    hydrate(pool, rows).await
}

/// Appends the filter's predicates as `AND` clauses.
pub fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    // text search
    if let Some(needle) = filter.search_needle() {
        let pattern = format!("%{}%", escape_like(&needle));

        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR features ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR materials ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR measurements ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ");
        query.push_bind(pattern);
        query.push("))");
    }

    // category / tag
    match filter.facet {
        Some(Facet::Category(category)) => {
            query.push(" AND category = ");
            query.push_bind(category.as_str());
        }
        Some(Facet::Tag(tag)) => {
            query.push(" AND ");
            query.push_bind(tag.as_str());
            query.push(" = ANY(tags)");
        }
        Some(Facet::AnyTag) => {
            query.push(" AND cardinality(tags) > 0");
        }
        None => {}
    }

    // price range on the effective price
    if let Some(min_price) = filter.min_price {
        query.push(" AND COALESCE(discounted_price, original_price) >= ");
        query.push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        query.push(" AND COALESCE(discounted_price, original_price) <= ");
        query.push_bind(max_price);
    }

    // color
    if let Some(ref color) = filter.color {
        query.push(
            " AND EXISTS (SELECT 1 FROM product_colors pc JOIN colors c ON c.id = pc.color_id \
             WHERE pc.product_id = products.id AND c.name = ",
        );
        query.push_bind(color.clone());
        query.push(")");
    }
}

/// Attaches colors and images to a page of product rows in two batch queries.
async fn hydrate(pool: &PgPool, rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let color_rows = sqlx::query_as::<_, ProductColorRow>(
        "SELECT pc.product_id, c.id, c.name, c.image
         FROM product_colors pc
         JOIN colors c ON c.id = pc.color_id
         WHERE pc.product_id = ANY($1)
         ORDER BY pc.product_id, c.id",
    )
    .bind(&product_ids)
    .fetch_all(pool)
    .await?;

    let all_images = sqlx::query_as::<_, ProductImage>(
        "SELECT id, product_id, image
         FROM product_images
         WHERE product_id = ANY($1)
         ORDER BY product_id, position ASC, id ASC",
    )
    .bind(&product_ids)
    .fetch_all(pool)
    .await?;

    let mut colors_map: HashMap<i32, Vec<Color>> = HashMap::new();
    for row in color_rows {
        colors_map.entry(row.product_id).or_default().push(Color {
            id: row.id,
            name: row.name,
            image: row.image,
        });
    }

    let mut images_map: HashMap<i32, Vec<ProductImage>> = HashMap::new();
    for image in all_images {
        images_map.entry(image.product_id).or_default().push(image);
    }

    let products = rows
        .into_iter()
        .map(|row| {
            let colors = colors_map.remove(&row.id).unwrap_or_default();
            let images = images_map.remove(&row.id).unwrap_or_default();
            row.into_product(colors, images)
        })
        .collect();

    Ok(products)
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
