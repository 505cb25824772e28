use serde::{Deserialize, Serialize};

use super::{Color, ProductResponse};

// Request types

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ListingParams {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SpecialTagParams {
    pub tag: Option<String>,
}

// View contexts

#[derive(Debug, Serialize)]
pub struct IndexContext {
    pub products: Vec<ProductResponse>,
    pub featured_product: Option<ProductResponse>,
    pub search_query: String,
}

#[derive(Debug, Serialize)]
pub struct ListingContext {
    pub products: Vec<ProductResponse>,
    pub search_query: String,
    pub colors: Vec<Color>,
    pub current_tag: String,
    pub current_color: Option<String>,
    pub current_min_price: Option<String>,
    pub current_max_price: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetailContext {
    pub product: ProductResponse,
    pub related_products: Vec<ProductResponse>,
}

#[derive(Debug, Serialize)]
pub struct SpecialTagsContext {
    pub products: Vec<ProductResponse>,
    pub current_tag: Option<String>,
}
