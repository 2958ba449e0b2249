use crate::data_models::ProductImage;
use crate::vision::{ImageUnderstanding, QueryContext, extract_query_line};

/// Turns an uploaded image plus optional hint/category into one search query.
///
/// Never fails: any provider problem falls back to [`fallback_query`].
pub struct QueryDeriver {
    provider: Option<Box<dyn ImageUnderstanding>>,
}

impl QueryDeriver {
    pub fn new(provider: Option<Box<dyn ImageUnderstanding>>) -> Self {
        Self { provider }
    }

    /// Rule-based only.
    pub fn unconfigured() -> Self {
        Self { provider: None }
    }

    pub fn is_provider_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn derive(&self, image: &ProductImage, hint_text: &str, category: &str) -> String {
        if let Some(provider) = &self.provider {
            let context = QueryContext {
                hint_text: hint_text.to_string(),
                category: category.to_string(),
            };
            match provider.describe(image, &context).await {
                Ok(text) => {
                    if let Some(query) = extract_query_line(&text) {
                        tracing::debug!(provider = provider.provider_name(), "Derived query from image");
                        return query;
                    }
                    tracing::warn!(
                        provider = provider.provider_name(),
                        "Image provider returned no usable text, using fallback"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.provider_name(),
                        "Image provider failed, using fallback: {}",
                        e
                    );
                }
            }
        }

        fallback_query(hint_text, category)
    }
}

pub fn fallback_query(hint_text: &str, category: &str) -> String {
    let hint = hint_text.trim();
    if !hint.is_empty() {
        return format!("{hint} {category}").trim().to_string();
    }
    if !category.is_empty() {
        return format!("best match {category}");
    }
    "best match product".to_string()
}

#[test]
fn test_fallback_query() {
    assert_eq!(fallback_query("pink corset top", "clothes"), "pink corset top clothes");
    assert_eq!(fallback_query("  pink corset top ", ""), "pink corset top");
    assert_eq!(fallback_query("", "makeup"), "best match makeup");
    assert_eq!(fallback_query("   ", "shoes"), "best match shoes");
    assert_eq!(fallback_query("", ""), "best match product");
}
