use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use std::sync::Arc;
use std::time::Instant;

use crate::error::AppError;
use crate::orchestrator::Orchestrator;

use super::models::{HealthResponse, SearchRequest, SearchResponse};

pub async fn search_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let start = Instant::now();

    let Json(request) = payload.map_err(|e| AppError::Rejected {
        status: e.status(),
        message: e.body_text(),
    })?;

    let response = orchestrator.handle(request).await.inspect_err(|e| {
        tracing::warn!(status = e.status_code().as_u16(), "Search failed: {}", e);
    })?;

    tracing::info!(
        query = %response.query,
        results = response.results.len(),
        processing_time_ms = start.elapsed().as_millis() as u64,
        "Search served"
    );

    Ok(Json(response))
}

pub async fn health_handler(State(orchestrator): State<Arc<Orchestrator>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        vision_configured: orchestrator.vision_configured(),
        shopping_configured: orchestrator.shopping_configured(),
    })
}
