//! Image-understanding providers.
//!
//! A provider looks at the uploaded product photo and answers with free-form
//! text; [`extract_query_line`] pulls the single search line out of it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::VisionConfig;
use crate::data_models::ProductImage;
use crate::error::AppError;
use crate::shopping::error_body;

pub const QUERY_INSTRUCTION: &str = "Look at this product photo and return ONE short product \
search query (12 words or fewer) that would find this exact item in an online shop. \
Include the brand only if you are confident. Include color, type and notable details. \
For makeup, include product type, shade and finish when visible. \
Reply with the query only, no quotes or extra text.";

/// Optional user-supplied context sent along with the image.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub hint_text: String,
    pub category: String,
}

impl QueryContext {
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        if !self.category.trim().is_empty() {
            lines.push(format!("Category: {}", self.category.trim()));
        }
        if !self.hint_text.trim().is_empty() {
            lines.push(format!("User hint: {}", self.hint_text.trim()));
        }
        lines.join("\n")
    }
}

#[async_trait]
pub trait ImageUnderstanding: Send + Sync {
    /// Ask the provider for a search query describing `image`.
    async fn describe(
        &self,
        image: &ProductImage,
        context: &QueryContext,
    ) -> Result<String, AppError>;

    fn provider_name(&self) -> &'static str;
}

/// Chat-completions client for any OpenAI-compatible vision endpoint.
pub struct OpenAiVision {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiVision {
    /// Returns `None` when no credential is configured.
    pub fn from_config(config: &VisionConfig) -> Result<Option<Self>, AppError> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build HTTP client: {e}")))?;

        Ok(Some(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }))
    }
}

#[async_trait]
impl ImageUnderstanding for OpenAiVision {
    async fn describe(
        &self,
        image: &ProductImage,
        context: &QueryContext,
    ) -> Result<String, AppError> {
        let mut text = QUERY_INSTRUCTION.to_string();
        let rendered = context.render();
        if !rendered.is_empty() {
            text.push_str("\n\n");
            text.push_str(&rendered);
        }

        let body = json!({
            "model": self.model,
            "max_tokens": 60,
            "temperature": 0.2,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": text },
                    { "type": "image_url", "image_url": { "url": image.data_url() } }
                ]
            }]
        });

        tracing::debug!(model = %self.model, media_type = image.media_type(), "Calling vision API");

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = error_body(res).await;
            return Err(AppError::Provider(format!(
                "Vision API error: {} {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: ChatCompletionResponse = res.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// First non-blank line, trimmed, with wrapping quotes removed.
pub fn extract_query_line(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
