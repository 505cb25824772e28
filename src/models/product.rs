use std::{collections::BTreeSet, fmt, str::FromStr};

use rust_decimal::{Decimal, dec, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use super::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Almirah,
    Beds,
    Chairs,
    Dining,
    Mattress,
    Sofa,
    Table,
    Safe,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Almirah,
        Category::Beds,
        Category::Chairs,
        Category::Dining,
        Category::Mattress,
        Category::Sofa,
        Category::Table,
        Category::Safe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Almirah => "almirah",
            Category::Beds => "beds",
            Category::Chairs => "chairs",
            Category::Dining => "dining",
            Category::Mattress => "mattress",
            Category::Sofa => "sofa",
            Category::Table => "table",
            Category::Safe => "safe",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductTag {
    Offers,
    NewArrivals,
    BestSellers,
}

impl ProductTag {
    pub const ALL: [ProductTag; 3] = [
        ProductTag::Offers,
        ProductTag::NewArrivals,
        ProductTag::BestSellers,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductTag::Offers => "offers",
            ProductTag::NewArrivals => "new_arrivals",
            ProductTag::BestSellers => "best_sellers",
        }
    }
}

impl fmt::Display for ProductTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: i32,
    pub product_id: i32,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub original_price: Decimal,
    #[serde(default)]
    pub discounted_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub tags: BTreeSet<ProductTag>,
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub measurements: String,
    #[serde(default = "default_in_stock")]
    pub is_in_stock: bool,
    #[serde(default)]
    pub delivery_availability: String,
    #[serde(default)]
    pub colors: Vec<Color>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Discounted price when set, original price otherwise.
    pub fn effective_price(&self) -> Decimal {
        self.discounted_price.unwrap_or(self.original_price)
    }

    /// Percentage off the original price, rounded to two places. `None` when
    /// the ratio is undefined or does not fit a `Decimal`.
    pub fn discount_rate(&self) -> Option<Decimal> {
        let discounted = self.discounted_price?;
        if self.original_price <= Decimal::ZERO {
            return None;
        }

        let kept = discounted
            .checked_div(self.original_price)?
            .checked_mul(dec!(100))?;
        Some(dec!(100).checked_sub(kept)?.round_dp(2))
    }

    /// Whole-number discount badge; only shown for an actual reduction.
    pub fn discount_percent(&self) -> Option<i64> {
        let discounted = self.discounted_price?;
        if self.original_price <= Decimal::ZERO || self.original_price <= discounted {
            return None;
        }

        self.original_price
            .checked_sub(discounted)?
            .checked_div(self.original_price)?
            .checked_mul(dec!(100))?
            .round()
            .to_i64()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    pub fn color(&self, color_id: i32) -> Option<&Color> {
        self.colors.iter().find(|color| color.id == color_id)
    }
}

/// Product payload with the derived pricing fields the storefront shows.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: Decimal,
    pub discount_rate: Option<Decimal>,
    pub discount_percent: Option<i64>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            effective_price: product.effective_price(),
            discount_rate: product.discount_rate(),
            discount_percent: product.discount_percent(),
            product,
        }
    }
}
