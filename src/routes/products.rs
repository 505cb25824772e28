use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        IndexContext, ListingContext, ListingParams, ProductDetailContext, ProductResponse,
        SearchParams, SpecialTagParams, SpecialTagsContext,
    },
    services::filter::{Facet, ProductFilter, normalize_tag_token, resolve_tag},
    utils::forms::non_empty,
};

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<IndexContext>> {
    let filter = ProductFilter::search(params.search.as_deref());
    let products: Vec<ProductResponse> = state
        .catalog
        .search_products(&filter)
        .await?
        .into_iter()
        .map(ProductResponse::from)
        .collect();

    Ok(Json(IndexContext {
        featured_product: products.first().cloned(),
        products,
        search_query: filter.search.unwrap_or_default(),
    }))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<ListingContext>> {
    let filter = ProductFilter::from_listing(&params);
    let products = state.catalog.search_products(&filter).await?;
    let colors = state.catalog.all_colors().await?;

    tracing::debug!("Listing matched {} products for {:?}", products.len(), filter);

    Ok(Json(ListingContext {
        products: products.into_iter().map(ProductResponse::from).collect(),
        search_query: filter.search.unwrap_or_default(),
        colors,
        current_tag: params
            .tag
            .as_deref()
            .map(normalize_tag_token)
            .unwrap_or_default(),
        current_color: filter.color,
        current_min_price: non_empty(params.min_price.as_deref()).map(str::to_string),
        current_max_price: non_empty(params.max_price.as_deref()).map(str::to_string),
    }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductDetailContext>> {
    let product = state
        .catalog
        .find_product(id)
        .await?
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    let related_products = state
        .catalog
        .related_products(&product)
        .await?
        .into_iter()
        .map(ProductResponse::from)
        .collect();

    Ok(Json(ProductDetailContext {
        product: product.into(),
        related_products,
    }))
}

/// Offers, new arrivals and best sellers. Without a recognised tag every
/// tagged product is listed.
pub async fn special_tags(
    State(state): State<AppState>,
    Query(params): Query<SpecialTagParams>,
) -> Result<Json<SpecialTagsContext>> {
    let tag = params.tag.as_deref().and_then(resolve_tag);
    let facet = tag.map(Facet::Tag).unwrap_or(Facet::AnyTag);

    let products = state
        .catalog
        .search_products(&ProductFilter::facet(facet))
        .await?
        .into_iter()
        .map(ProductResponse::from)
        .collect();

    Ok(Json(SpecialTagsContext {
        products,
        current_tag: tag.map(|tag| tag.as_str().to_string()),
    }))
}
