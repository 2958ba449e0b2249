use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// First run of ASCII digits, optionally followed by a decimal point and more digits.
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("price pattern is a valid regex")
});

const IMAGE_MARKER: &str = "data:image/";

/// An uploaded image, carried as a `data:image/...` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    data_url: String,
}

impl ProductImage {
    pub fn from_data_url(data_url: impl Into<String>) -> Result<Self, AppError> {
        let data_url = data_url.into();
        if !data_url.starts_with(IMAGE_MARKER) {
            return Err(AppError::Validation("Please upload an image.".to_string()));
        }
        Ok(Self { data_url })
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// `image/png` for `data:image/png;base64,...`.
    pub fn media_type(&self) -> &str {
        let rest = &self.data_url["data:".len()..];
        let end = rest.find([';', ',']).unwrap_or(rest.len());
        &rest[..end]
    }
}

/// One normalized shopping-search result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Offers ordered cheapest-first, unknown prices last.
pub type RankedResultSet = Vec<Offer>;

/// Best-effort numeric reading of a human-readable price.
///
/// Commas are stripped first, then the first digit run (with an optional
/// fractional part) is parsed. Ranges like "$10-$20" yield only the first
/// number.
pub fn parse_price(price_text: &str) -> Option<f64> {
    let cleaned = price_text.replace(',', "");
    PRICE_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn compare_prices(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable ascending sort by price; offers without a price keep their
/// relative order at the end.
pub fn rank_offers(mut offers: Vec<Offer>) -> RankedResultSet {
    offers.sort_by(|a, b| compare_prices(a.price, b.price));
    offers
}
