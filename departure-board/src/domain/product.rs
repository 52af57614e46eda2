//! Transit product (mode of transport) type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown product name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product: {0:?}")]
pub struct UnknownProduct(String);

/// A transit product category, as named by the feed.
///
/// The feed groups lines into a fixed set of products. Each product is
/// requested (or not) with its own boolean query parameter, and drives the
/// colour of the line badge on the board.
///
/// # Examples
///
/// ```
/// use departure_board::domain::Product;
///
/// let subway = Product::parse("subway").unwrap();
/// assert_eq!(subway, Product::Subway);
/// assert_eq!(subway.as_str(), "subway");
///
/// // Names are case-sensitive, exactly as the feed sends them
/// assert!(Product::parse("Subway").is_err());
/// assert!(Product::parse("cable-car").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Suburban,
    Subway,
    Tram,
    Bus,
    Ferry,
    Express,
    Regional,
}

/// An RGB colour, `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0x000000);

    /// Hex notation, e.g. `#224f86`.
    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0)
    }
}

impl Product {
    /// Every product the feed knows, in the feed's canonical order.
    pub const ALL: [Product; 7] = [
        Product::Suburban,
        Product::Subway,
        Product::Tram,
        Product::Bus,
        Product::Ferry,
        Product::Express,
        Product::Regional,
    ];

    /// Parse a product from its wire name.
    pub fn parse(s: &str) -> Result<Self, UnknownProduct> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProduct(s.to_string()))
    }

    /// Returns the wire name of this product.
    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Suburban => "suburban",
            Product::Subway => "subway",
            Product::Tram => "tram",
            Product::Bus => "bus",
            Product::Ferry => "ferry",
            Product::Express => "express",
            Product::Regional => "regional",
        }
    }

    /// Badge colour for lines of this product.
    pub fn badge_color(&self) -> Rgb {
        match self {
            Product::Bus => Rgb(0x993399),
            Product::Tram => Rgb(0xcc0000),
            Product::Suburban => Rgb(0x37874a),
            // Ferries share the subway blue
            Product::Subway | Product::Ferry => Rgb(0x224f86),
            Product::Express | Product::Regional => Rgb(0xe21900),
        }
    }
}

/// Badge colour for an optional product; unknown products get a black badge.
pub fn badge_color(product: Option<Product>) -> Rgb {
    product.map_or(Rgb::BLACK, |p| p.badge_color())
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
