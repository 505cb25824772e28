use rust_decimal::Decimal;

use crate::models::{Category, ListingParams, Product, ProductTag};

/// Category-or-tag narrowing selected by a `tag` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Category(Category),
    Tag(ProductTag),
    /// Any product carrying at least one tag.
    AnyTag,
}

/// Combined catalog predicate. Every field left as `None` imposes no
/// constraint; the fields that are set are ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub facet: Option<Facet>,
    pub color: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    pub fn from_listing(params: &ListingParams) -> Self {
        Self {
            search: non_blank(params.search.as_deref()),
            facet: params.tag.as_deref().and_then(resolve_facet),
            color: non_blank(params.color.as_deref()),
            min_price: parse_price(params.min_price.as_deref()),
            max_price: parse_price(params.max_price.as_deref()),
        }
    }

    pub fn search(query: Option<&str>) -> Self {
        Self {
            search: non_blank(query),
            ..Self::default()
        }
    }

    pub fn facet(facet: Facet) -> Self {
        Self {
            facet: Some(facet),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Lowercased search needle, if any.
    pub fn search_needle(&self) -> Option<String> {
        self.search.as_deref().map(str::to_lowercase)
    }

    /// Evaluates the filter against one product.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(needle) = self.search_needle() {
            if !matches_search(product, &needle) {
                return false;
            }
        }

        match self.facet {
            Some(Facet::Category(category)) if product.category != Some(category) => return false,
            Some(Facet::Tag(tag)) if !product.tags.contains(&tag) => return false,
            Some(Facet::AnyTag) if product.tags.is_empty() => return false,
            _ => {}
        }

        let price = product.effective_price();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }

        if let Some(color) = &self.color {
            if !product.colors.iter().any(|c| &c.name == color) {
                return false;
            }
        }

        true
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    [
        &product.name,
        &product.features,
        &product.materials,
        &product.measurements,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
        || product.tags.iter().any(|tag| tag.as_str().contains(needle))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses an optional price bound. Blank or malformed input yields `None`.
pub fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<Decimal>() {
        Ok(price) => Some(price),
        Err(_) => {
            tracing::debug!("Ignoring malformed price bound {:?}", raw);
            None
        }
    }
}

/// Canonical form of a tag token: trimmed, lowercased, spaces as underscores.
pub fn normalize_tag_token(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Maps a tag token (including the common singular spellings) to a tag.
pub fn resolve_tag(raw: &str) -> Option<ProductTag> {
    match normalize_tag_token(raw).as_str() {
        "offers" | "offer" => Some(ProductTag::Offers),
        "new_arrivals" | "new_arrival" | "newarrival" | "newarrivals" => {
            Some(ProductTag::NewArrivals)
        }
        "best_sellers" | "best_seller" | "bestseller" | "bestsellers" => {
            Some(ProductTag::BestSellers)
        }
        _ => None,
    }
}

/// Resolves a `tag` query token: categories win over tags, and unknown tokens
/// apply no filter.
pub fn resolve_facet(raw: &str) -> Option<Facet> {
    let token = normalize_tag_token(raw);
    if token.is_empty() {
        return None;
    }

    if let Ok(category) = token.parse::<Category>() {
        return Some(Facet::Category(category));
    }

    match resolve_tag(&token) {
        Some(tag) => Some(Facet::Tag(tag)),
        None => {
            tracing::debug!("Ignoring unknown tag token {:?}", token);
            None
        }
    }
}
