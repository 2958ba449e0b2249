pub mod api;
pub mod config;
pub mod data_models;
pub mod error;
pub mod orchestrator;
pub mod query_deriver;
pub mod shopping;
pub mod vision;
