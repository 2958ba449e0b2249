use serde::Serialize;

pub use crate::orchestrator::{SearchRequest, SearchResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub vision_configured: bool,
    pub shopping_configured: bool,
}
