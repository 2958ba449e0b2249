use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::ShoppingConfig;
use crate::data_models::{Offer, RankedResultSet, parse_price, rank_offers};
use crate::error::AppError;

const ENGINE: &str = "google_shopping";

/// SerpApi `google_shopping` client.
pub struct ShoppingSearchClient {
    client: Client,
    config: ShoppingConfig,
}

/// Records stay untyped until truncation; entries past the cap are never decoded.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    shopping_results: Vec<Value>,
}

/// One record as the provider sends it. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct RawOffer {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub extracted_price: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl RawOffer {
    pub fn normalize(self) -> Offer {
        let price = self
            .extracted_price
            .or_else(|| self.price.as_deref().and_then(parse_price));
        Offer {
            title: self.title.unwrap_or_default(),
            link: self.link.or(self.product_link).unwrap_or_default(),
            source: self.source,
            price,
            price_text: self.price,
            thumbnail: self.thumbnail,
        }
    }
}

impl ShoppingSearchClient {
    pub fn new(config: ShoppingConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// One request, no retry. The first `max_results` records are normalized
    /// and then ranked cheapest-first.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<RankedResultSet, AppError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(AppError::Configuration(
                "Missing SERPAPI_KEY in environment variables.".to_string(),
            ));
        };

        let res = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("engine", ENGINE),
                ("q", query),
                ("api_key", api_key),
                ("gl", self.config.country.as_str()),
                ("hl", self.config.language.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = error_body(res).await;
            return Err(AppError::Provider(format!(
                "SerpAPI error: {} {}",
                status.as_u16(),
                text
            )));
        }

        let data: SearchResponse = res.json().await?;
        let total = data.shopping_results.len();

        let offers = data
            .shopping_results
            .into_iter()
            .take(max_results)
            .map(|raw| {
                serde_json::from_value::<RawOffer>(raw)
                    .map(RawOffer::normalize)
                    .map_err(|e| {
                        AppError::Provider(format!("Failed to parse provider response: {e}"))
                    })
            })
            .collect::<Result<Vec<Offer>, AppError>>()?;

        tracing::info!(query, total, kept = offers.len(), "Shopping search complete");

        Ok(rank_offers(offers))
    }
}

/// Body text of a failed response. A body that cannot be read is reported
/// in place of the text.
pub(crate) async fn error_body(res: reqwest::Response) -> String {
    match res.text().await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to read provider error body: {}", e);
            format!("<unreadable body: {e}>")
        }
    }
}
