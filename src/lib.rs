//! AquaMon - Parameter Health & Advisory Pipeline
//!
//! Core library behind an aquarium water-chemistry dashboard:
//!
//! - **status**: pure classification of a reading against its optimal range
//! - **aggregate**: latest-wins reduction into a severity-ordered dashboard view
//! - **advisory**: structured-completion client and orchestration for
//!   AI-generated remediation advice, with graceful degradation when the
//!   remote service is unavailable
//!
//! Persistence, authentication, and routing live in the host application;
//! this crate only consumes their data and serves view-models back.

pub mod aggregate;
pub mod config;
pub mod errors;
pub mod status;
pub mod types;

pub mod advisory;

// Re-export commonly used types
pub use errors::{AdvisoryError, Result};
pub use types::{ParameterStatusView, StatusResult, Tier};
