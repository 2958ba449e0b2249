use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealfinder::config::VisionConfig;
use dealfinder::data_models::ProductImage;
use dealfinder::error::AppError;
use dealfinder::query_deriver::QueryDeriver;
use dealfinder::vision::{ImageUnderstanding, OpenAiVision, QueryContext};

mod test_helpers {
    use super::*;

    pub fn image() -> ProductImage {
        ProductImage::from_data_url("data:image/png;base64,AAAA").unwrap()
    }

    /// Replays a canned answer and counts calls.
    pub struct FakeVision {
        pub answer: Result<String, String>,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeVision {
        pub fn answering(text: &str) -> Self {
            Self {
                answer: Ok(text.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                answer: Err(message.to_string()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl ImageUnderstanding for FakeVision {
        async fn describe(
            &self,
            _image: &ProductImage,
            _context: &QueryContext,
        ) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().map_err(AppError::Provider)
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }
}

use test_helpers::*;

#[tokio::test]
async fn test_unconfigured_uses_hint_and_category() {
    let deriver = QueryDeriver::unconfigured();
    assert!(!deriver.is_provider_configured());
    let query = deriver.derive(&image(), "pink corset top", "clothes").await;
    assert_eq!(query, "pink corset top clothes");
}

#[tokio::test]
async fn test_unconfigured_without_hint() {
    let deriver = QueryDeriver::unconfigured();
    assert_eq!(deriver.derive(&image(), "", "makeup").await, "best match makeup");
    assert_eq!(deriver.derive(&image(), "", "").await, "best match product");
}

#[tokio::test]
async fn test_hint_with_empty_category_has_no_trailing_space() {
    let deriver = QueryDeriver::unconfigured();
    assert_eq!(deriver.derive(&image(), " red heels ", "").await, "red heels");
}

#[tokio::test]
async fn test_provider_answer_is_used() {
    let fake = FakeVision::answering("  \"black leather crossbody bag gold chain\"\n");
    let calls = fake.calls.clone();
    let deriver = QueryDeriver::new(Some(Box::new(fake)));

    let query = deriver.derive(&image(), "bag", "bags").await;
    assert_eq!(query, "black leather crossbody bag gold chain");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_provider_failure_falls_back() {
    let fake = FakeVision::failing("Vision API error: 500 boom");
    let calls = fake.calls.clone();
    let deriver = QueryDeriver::new(Some(Box::new(fake)));

    assert_eq!(deriver.derive(&image(), "pink corset top", "clothes").await, "pink corset top clothes");
    assert_eq!(deriver.derive(&image(), "", "shoes").await, "best match shoes");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_provider_blank_answer_falls_back() {
    let deriver = QueryDeriver::new(Some(Box::new(FakeVision::answering("   \n  "))));
    assert_eq!(deriver.derive(&image(), "", "").await, "best match product");
}

mod openai_vision {
    use super::*;

    fn config_for(server: &MockServer) -> VisionConfig {
        VisionConfig {
            api_key: Some("vision-key".to_string()),
            base_url: format!("{}/v1/", server.uri()),
            model: "test-model".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_sends_image_and_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("vision-key"))
            .and(body_partial_json(json!({ "model": "test-model" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "nude matte lipstick" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiVision::from_config(&config_for(&server)).unwrap().unwrap();
        let deriver = QueryDeriver::new(Some(Box::new(provider)));
        let query = deriver.derive(&image(), "lipstick", "makeup").await;
        assert_eq!(query, "nude matte lipstick");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let content = &body["messages"][0]["content"];
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,AAAA");
        let text = content[0]["text"].as_str().unwrap();
        assert!(text.contains("Category: makeup"));
        assert!(text.contains("User hint: lipstick"));
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiVision::from_config(&config_for(&server)).unwrap().unwrap();
        let err = provider
            .describe(&image(), &QueryContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
        assert_eq!(err.to_string(), "Vision API error: 429 rate limited");
    }

    #[tokio::test]
    async fn test_error_status_in_deriver_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiVision::from_config(&config_for(&server)).unwrap().unwrap();
        let deriver = QueryDeriver::new(Some(Box::new(provider)));
        assert_eq!(deriver.derive(&image(), "", "bags").await, "best match bags");
    }

    #[tokio::test]
    async fn test_empty_choices_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let provider = OpenAiVision::from_config(&config_for(&server)).unwrap().unwrap();
        let deriver = QueryDeriver::new(Some(Box::new(provider)));
        assert_eq!(deriver.derive(&image(), "blue jeans", "").await, "blue jeans");
    }
}
