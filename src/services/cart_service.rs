use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::{
    database::CatalogStore,
    error::{AppError, Result},
    models::{AddToCartForm, Cart, CartAction, CartContext, CartKey, CartLine, Product},
    utils::forms::{non_empty, parse_quantity},
};

pub const PRODUCT_NOT_FOUND: &str = "Product not found";
pub const COLOR_REQUIRED: &str = "Please select a color before adding to cart";
pub const INVALID_COLOR: &str = "Please select a valid color";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedToCart {
    pub key: CartKey,
    /// Quantity added by this call, after coercion.
    pub added: u32,
    /// Total number of items across the whole cart.
    pub cart_count: u64,
}

#[derive(Debug, Clone)]
pub struct MaterializedCart {
    pub context: CartContext,
    /// Number of lines dropped because their product no longer exists.
    pub pruned: usize,
}

/// Adds a product to the cart.
///
/// Products with colors require one of their own colors; products without
/// colors ignore whatever color was sent.
pub async fn add_to_cart(
    catalog: &dyn CatalogStore,
    cart: &mut Cart,
    product_id: i32,
    form: &AddToCartForm,
) -> Result<AddedToCart> {
    let product = catalog
        .find_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;

    let quantity = parse_quantity(form.quantity.as_deref());
    let color_id = select_color(&product, form.color.as_deref())?;

    let key = CartKey::new(product.id, color_id);
    cart.add(key, quantity);

    let cart_count = cart.item_count();
    tracing::debug!(
        "Added {} x {} to cart, {} items in cart",
        quantity,
        key,
        cart_count
    );

    Ok(AddedToCart {
        key,
        added: quantity,
        cart_count,
    })
}

fn select_color(product: &Product, raw: Option<&str>) -> Result<Option<i32>> {
    if !product.has_colors() {
        return Ok(None);
    }

    let raw = non_empty(raw)
        .ok_or_else(|| AppError::ValidationError(COLOR_REQUIRED.to_string()))?;

    let color = raw
        .parse::<i32>()
        .ok()
        .and_then(|id| product.color(id))
        .ok_or_else(|| {
            tracing::debug!("Color {:?} is not offered for product {}", raw, product.id);
            AppError::ValidationError(INVALID_COLOR.to_string())
        })?;

    Ok(Some(color.id))
}

/// Applies an increase/decrease/remove to the line named by its session key.
/// Unknown or malformed keys leave the cart untouched.
pub fn update_quantity(cart: &mut Cart, raw_key: &str, action: CartAction) -> bool {
    let key = match raw_key.parse::<CartKey>() {
        Ok(key) => key,
        Err(e) => {
            tracing::debug!("Ignoring cart update: {}", e);
            return false;
        }
    };

    let applied = cart.apply(&key, action);
    if applied {
        tracing::debug!("Applied {:?} to {}", action, key);
    } else {
        tracing::debug!("Ignoring {:?} for unknown cart key {}", action, key);
    }

    applied
}

/// Resolves every cart line against the catalog.
///
/// Lines whose product has been deleted are removed from `cart` and left out
/// of the result.
pub async fn materialize(catalog: &dyn CatalogStore, cart: &mut Cart) -> Result<MaterializedCart> {
    let keys: Vec<CartKey> = cart.keys().copied().collect();

    let product_ids: Vec<i32> = keys
        .iter()
        .map(|key| key.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let color_ids: Vec<i32> = keys
        .iter()
        .filter_map(|key| key.color_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let products = catalog.find_products_by_ids(&product_ids).await?;
    let colors = catalog.find_colors_by_ids(&color_ids).await?;

    let mut cart_items = Vec::with_capacity(keys.len());
    let mut subtotal = Decimal::ZERO;
    let mut pruned = 0;

    for key in keys {
        let Some(product) = products.get(&key.product_id) else {
            tracing::warn!(
                "Product {} no longer exists, removing {} from cart",
                key.product_id,
                key
            );
            cart.remove(&key);
            pruned += 1;
            continue;
        };

        let Some(quantity) = cart.get(&key) else {
            continue;
        };

        let color = key.color_id.and_then(|color_id| {
            let color = colors.get(&color_id).cloned();
            if color.is_none() {
                tracing::debug!("Color {} not found for cart line {}", color_id, key);
            }
            color
        });

        let total = match line_total(product, quantity)
            .and_then(|total| add_to_subtotal(subtotal, total).map(|sum| (total, sum)))
        {
            Ok((total, sum)) => {
                subtotal = sum;
                total
            }
            Err(e) => {
                tracing::error!("Skipping cart line {}: {}", key, e);
                continue;
            }
        };

        cart_items.push(CartLine {
            key: key.to_string(),
            product: product.clone().into(),
            color,
            quantity,
            total,
        });
    }

    Ok(MaterializedCart {
        context: CartContext {
            cart_items,
            subtotal,
            total: subtotal,
        },
        pruned,
    })
}

/// Effective price times quantity.
pub fn line_total(product: &Product, quantity: u32) -> Result<Decimal> {
    product
        .effective_price()
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| {
            AppError::TransientDataError(format!(
                "line total overflow for product {} x {}",
                product.id, quantity
            ))
        })
}

fn add_to_subtotal(subtotal: Decimal, total: Decimal) -> Result<Decimal> {
    subtotal
        .checked_add(total)
        .ok_or_else(|| AppError::TransientDataError("cart subtotal overflow".to_string()))
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;
    use crate::{
        database::MemoryCatalog,
        models::{Category, Color},
    };

    fn color(id: i32, name: &str) -> Color {
        Color {
            id,
            name: name.to_string(),
            image: None,
        }
    }

    fn product(id: i32, colors: Vec<Color>) -> Product {
        Product {
            id,
            name: format!("Product {id}"),
            original_price: dec!(100),
            discounted_price: Some(dec!(80)),
            category: Some(Category::Table),
            tags: Default::default(),
            features: String::new(),
            materials: String::new(),
            measurements: String::new(),
            is_in_stock: true,
            delivery_availability: String::new(),
            colors,
            images: Vec::new(),
        }
    }

    fn catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.insert_color(color(9, "Ivory"));
        catalog.insert_product(product(5, vec![color(3, "Walnut"), color(4, "Oak")]));
        catalog.insert_product(product(6, Vec::new()));
        catalog
    }

    fn form(quantity: Option<&str>, color: Option<&str>) -> AddToCartForm {
        AddToCartForm {
            quantity: quantity.map(str::to_string),
            color: color.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn add_accumulates_on_same_key() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let added = add_to_cart(&catalog, &mut cart, 5, &form(Some("2"), Some("3")))
            .await
            .unwrap();
        assert_eq!(added.cart_count, 2);
        assert_eq!(cart.to_record().get("5|3"), Some(&2));

        let added = add_to_cart(&catalog, &mut cart, 5, &form(Some("1"), Some("3")))
            .await
            .unwrap();
        assert_eq!(added.cart_count, 3);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.to_record().get("5|3"), Some(&3));
    }

    #[tokio::test]
    async fn color_is_required_for_colored_products() {
        let catalog = catalog();
        let mut cart = Cart::new();

        for missing in [None, Some(""), Some("  ")] {
            let err = add_to_cart(&catalog, &mut cart, 5, &form(None, missing))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(ref m) if m == COLOR_REQUIRED));
        }
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn foreign_color_is_rejected() {
        let catalog = catalog();
        let mut cart = Cart::new();

        for bad in ["9", "42", "red"] {
            let err = add_to_cart(&catalog, &mut cart, 5, &form(None, Some(bad)))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(ref m) if m == INVALID_COLOR));
        }
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn colorless_product_ignores_color() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let added = add_to_cart(&catalog, &mut cart, 6, &form(None, None)).await.unwrap();
        assert_eq!(added.key, CartKey::new(6, None));

        let added = add_to_cart(&catalog, &mut cart, 6, &form(None, Some("3")))
            .await
            .unwrap();
        assert_eq!(added.key, CartKey::new(6, None));
        assert_eq!(cart.get(&CartKey::new(6, None)), Some(2));
    }

    #[tokio::test]
    async fn bad_quantity_coerces_to_one() {
        let catalog = catalog();

        for raw in [None, Some("abc"), Some("0"), Some("-4"), Some("")] {
            let mut cart = Cart::new();
            let added = add_to_cart(&catalog, &mut cart, 6, &form(raw, None)).await.unwrap();
            assert_eq!(added.added, 1, "{raw:?}");
            assert_eq!(added.cart_count, 1);
        }
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let err = add_to_cart(&catalog, &mut cart, 77, &form(None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn update_quantity_parses_session_keys() {
        let mut cart = Cart::new();
        cart.add(CartKey::new(5, Some(3)), 2);

        assert!(update_quantity(&mut cart, "5|3", CartAction::Decrease));
        assert_eq!(cart.get(&CartKey::new(5, Some(3))), Some(1));

        assert!(!update_quantity(&mut cart, "not-a-key", CartAction::Remove));
        assert!(!update_quantity(&mut cart, "5", CartAction::Increase));

        assert!(update_quantity(&mut cart, "5|3", CartAction::Decrease));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn materialize_computes_totals() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(CartKey::new(5, Some(3)), 2);
        cart.add(CartKey::new(6, None), 1);

        let materialized = materialize(&catalog, &mut cart).await.unwrap();
        let context = materialized.context;

        assert_eq!(materialized.pruned, 0);
        assert_eq!(context.cart_items.len(), 2);
        assert_eq!(context.cart_items[0].key, "5|3");
        assert_eq!(context.cart_items[0].total, dec!(160));
        assert_eq!(
            context.cart_items[0].color.as_ref().map(|c| c.name.as_str()),
            Some("Walnut")
        );
        assert_eq!(context.cart_items[1].total, dec!(80));
        assert_eq!(context.subtotal, dec!(240));
        assert_eq!(context.total, context.subtotal);
    }

    #[tokio::test]
    async fn materialize_prunes_deleted_products() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(CartKey::new(5, Some(3)), 1);
        cart.add(CartKey::new(6, None), 4);

        catalog.remove_product(6);

        let materialized = materialize(&catalog, &mut cart).await.unwrap();
        assert_eq!(materialized.pruned, 1);
        assert_eq!(materialized.context.cart_items.len(), 1);
        assert_eq!(materialized.context.subtotal, dec!(80));
        assert_eq!(cart.get(&CartKey::new(6, None)), None);
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn materialize_keeps_line_when_color_is_gone() {
        let catalog = catalog();
        let mut cart = Cart::new();
        cart.add(CartKey::new(6, Some(99)), 1);

        let materialized = materialize(&catalog, &mut cart).await.unwrap();
        assert_eq!(materialized.context.cart_items.len(), 1);
        assert!(materialized.context.cart_items[0].color.is_none());
    }
}
