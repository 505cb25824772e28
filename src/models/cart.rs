use std::{collections::BTreeMap, fmt, num::ParseIntError, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Color, ProductResponse};

/// Session wire form of a cart: `"<product_id>"` or `"<product_id>|<color_id>"`
/// mapped to a quantity.
pub type CartRecord = BTreeMap<String, i64>;

/// Identity of one cart line: a product plus the color picked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CartKey {
    pub product_id: i32,
    pub color_id: Option<i32>,
}

impl CartKey {
    pub fn new(product_id: i32, color_id: Option<i32>) -> Self {
        Self {
            product_id,
            color_id,
        }
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color_id {
            Some(color_id) => write!(f, "{}|{}", self.product_id, color_id),
            None => write!(f, "{}", self.product_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cart key {key:?}: {source}")]
pub struct CartKeyError {
    key: String,
    source: ParseIntError,
}

impl FromStr for CartKey {
    type Err = CartKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |source| CartKeyError {
            key: s.to_string(),
            source,
        };

        let (product, color) = match s.split_once('|') {
            Some((product, color)) => (product, color.trim()),
            None => (s, ""),
        };

        let product_id = product.trim().parse::<i32>().map_err(invalid)?;
        let color_id = if color.is_empty() {
            None
        } else {
            Some(color.parse::<i32>().map_err(invalid)?)
        };

        Ok(Self::new(product_id, color_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Increase,
    Decrease,
    Remove,
}

/// Per-session cart. Every stored quantity is at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: BTreeMap<CartKey, u32>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a cart from its session record, dropping entries that do not
    /// parse or carry a non-positive quantity.
    pub fn from_record(record: CartRecord) -> Self {
        let mut cart = Self::new();

        for (raw_key, quantity) in record {
            let key = match raw_key.parse::<CartKey>() {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!("Dropping cart entry: {}", e);
                    continue;
                }
            };

            let Ok(quantity) = u32::try_from(quantity) else {
                tracing::warn!("Dropping cart entry {} with quantity {}", raw_key, quantity);
                continue;
            };

            if quantity == 0 {
                tracing::warn!("Dropping cart entry {} with quantity 0", raw_key);
                continue;
            }

            let entry = cart.lines.entry(key).or_insert(0);
            *entry = entry.saturating_add(quantity);
        }

        cart
    }

    pub fn to_record(&self) -> CartRecord {
        self.lines
            .iter()
            .map(|(key, quantity)| (key.to_string(), i64::from(*quantity)))
            .collect()
    }

    pub fn get(&self, key: &CartKey) -> Option<u32> {
        self.lines.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CartKey> {
        self.lines.keys()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities over every line.
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|quantity| u64::from(*quantity)).sum()
    }

    /// Adds `quantity` (at least 1) to the line, creating it when absent.
    pub fn add(&mut self, key: CartKey, quantity: u32) -> u32 {
        let entry = self.lines.entry(key).or_insert(0);
        *entry = entry.saturating_add(quantity.max(1));
        *entry
    }

    /// Applies a quantity change to an existing line. Returns false when the
    /// key is not in the cart.
    pub fn apply(&mut self, key: &CartKey, action: CartAction) -> bool {
        let Some(quantity) = self.lines.get_mut(key) else {
            return false;
        };

        match action {
            CartAction::Increase => *quantity = quantity.saturating_add(1),
            CartAction::Decrease if *quantity > 1 => *quantity -= 1,
            CartAction::Decrease | CartAction::Remove => {
                self.lines.remove(key);
            }
        }

        true
    }

    pub fn remove(&mut self, key: &CartKey) -> Option<u32> {
        self.lines.remove(key)
    }
}

// Request types

/// Add-to-cart form body. Both fields arrive as raw strings so that bad
/// input can be coerced instead of rejected.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AddToCartForm {
    pub quantity: Option<String>,
    pub color: Option<String>,
}

/// Cart page form: exactly one of the fields names the cart key to change.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CartUpdateForm {
    pub increase: Option<String>,
    pub decrease: Option<String>,
    pub remove: Option<String>,
}

impl CartUpdateForm {
    pub fn action(&self) -> Option<(CartAction, &str)> {
        if let Some(key) = &self.increase {
            return Some((CartAction::Increase, key.as_str()));
        }
        if let Some(key) = &self.decrease {
            return Some((CartAction::Decrease, key.as_str()));
        }
        self.remove
            .as_deref()
            .map(|key| (CartAction::Remove, key))
    }
}

// Response types

/// One materialized cart line as shown on the cart page.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub key: String,
    pub product: ProductResponse,
    pub color: Option<Color>,
    pub quantity: u32,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartContext {
    pub cart_items: Vec<CartLine>,
    pub subtotal: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddToCartResponse {
    pub status: &'static str,
    pub message: String,
    pub cart_count: u64,
    pub redirect_url: String,
}
