//! Remote advisory pipeline
//!
//! - `client`: typed wrapper around the structured-completion endpoint
//! - `orchestrator`: decides when to call it and assembles the response

pub mod client;
pub mod orchestrator;

pub use client::{AdvisoryClient, CompletionRequest, ModelParams};
pub use orchestrator::{AdviceRequest, AdvisoryOrchestrator, CompletionBackend};
