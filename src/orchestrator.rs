use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::data_models::{Offer, ProductImage};
use crate::error::AppError;
use crate::query_deriver::QueryDeriver;
use crate::shopping::ShoppingSearchClient;
use crate::vision::{ImageUnderstanding, OpenAiVision};

pub const MAX_RESULTS: usize = 12;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default, alias = "imageBase64")]
    pub image_data: Option<String>,
    #[serde(default)]
    pub hint_text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<Offer>,
}

/// Runs one request: validate, derive the query, search, rank.
pub struct Orchestrator {
    deriver: QueryDeriver,
    shopping: ShoppingSearchClient,
    max_results: usize,
}

impl Orchestrator {
    pub fn new(deriver: QueryDeriver, shopping: ShoppingSearchClient) -> Self {
        Self {
            deriver,
            shopping,
            max_results: MAX_RESULTS,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let vision = OpenAiVision::from_config(&config.vision)?
            .map(|v| Box::new(v) as Box<dyn ImageUnderstanding>);
        if vision.is_none() {
            tracing::info!("VISION_API_KEY not set, queries will be derived from hint/category only");
        }
        if config.shopping.api_key.is_none() {
            tracing::warn!("SERPAPI_KEY not set, every search will fail until it is configured");
        }

        let shopping = ShoppingSearchClient::new(config.shopping.clone())?;
        Ok(Self::new(QueryDeriver::new(vision), shopping))
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn vision_configured(&self) -> bool {
        self.deriver.is_provider_configured()
    }

    pub fn shopping_configured(&self) -> bool {
        self.shopping.is_configured()
    }

    pub async fn handle(&self, request: SearchRequest) -> Result<SearchResponse, AppError> {
        // absent and null are both treated as empty
        let image = ProductImage::from_data_url(request.image_data.unwrap_or_default())?;
        let hint_text = request.hint_text.unwrap_or_default();
        let category = request.category.unwrap_or_default();

        let query = self.deriver.derive(&image, &hint_text, &category).await;
        tracing::info!(%query, %category, "Derived search query");

        let results = self.shopping.search(&query, self.max_results).await?;

        Ok(SearchResponse { query, results })
    }
}
