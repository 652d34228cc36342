//! Advisory orchestration
//!
//! Decides whether an out-of-range reading warrants a remote advisory call,
//! shapes the prompt context, validates the structured payload, and
//! assembles the final response. Remote failures never cross this boundary
//! as-is: the original kind is logged and collapsed to a single
//! "service unavailable" signal so the dashboard still renders the numeric
//! status without the narrative.

use crate::advisory::client::{AdvisoryClient, CompletionRequest, ModelParams};
use crate::errors::{AdvisoryError, Result};
use crate::status::{classify, deviation_direction};
use crate::types::{
    AdvisoryContext, AdvisoryResponse, AdvisoryResult, Direction, OptimalRange, QuantitySummary,
    RangeSummary, Tier, TrackedQuantity,
};
use async_trait::async_trait;

/// Fixed persona for every advisory completion.
pub const SYSTEM_PROMPT: &str = "You are an experienced aquarium water-chemistry specialist. \
You analyze out-of-range water parameters and give practical, safe remediation steps \
for home aquarium keepers. Be specific and concise, and never recommend sudden large \
corrections that would shock livestock.";

/// Local analysis text for in-range readings; no remote call is made.
pub const IN_RANGE_ANALYSIS: &str =
    "This parameter is within its optimal range. No corrective action is needed.";

/// Local recommendations paired with `IN_RANGE_ANALYSIS`.
pub const IN_RANGE_RECOMMENDATIONS: [&str; 3] = [
    "Keep testing this parameter on your regular schedule.",
    "Continue routine partial water changes and filter maintenance.",
    "Log readings after any change to stocking, feeding, or equipment.",
];

/// Attached to every advisory response, remote or local.
pub const DISCLAIMER: &str = "This advice is generated automatically and may be \
incomplete or wrong for your setup. Verify recommendations against a trusted source \
before making changes to your aquarium.";

const RESPONSE_SCHEMA_NAME: &str = "water_parameter_advisory";

/// Everything the orchestrator needs to advise on one reading.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub tank_category: String,
    pub quantity: TrackedQuantity,
    pub current_value: f64,
    pub range: OptimalRange,
}

/// Seam between the orchestrator and the completion service.
///
/// Production code uses [`AdvisoryClient`]; tests substitute a stub to count
/// calls and inject failures.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete_advisory(&self, request: CompletionRequest) -> Result<AdvisoryResult>;
}

#[async_trait]
impl CompletionBackend for AdvisoryClient {
    async fn complete_advisory(&self, request: CompletionRequest) -> Result<AdvisoryResult> {
        self.complete(request).await
    }
}

/// Orchestrates classification, the remote advisory call, and response
/// assembly.
pub struct AdvisoryOrchestrator<B: CompletionBackend> {
    backend: B,
}

impl<B: CompletionBackend> AdvisoryOrchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Produce an advisory response for one reading.
    ///
    /// In-range readings get the deterministic local text and trigger zero
    /// remote calls. Out-of-range readings trigger exactly one completion
    /// call; any failure on that path is logged and collapsed to
    /// [`AdvisoryError::Unavailable`]. Callers are expected to filter out
    /// quantities with no measurement before reaching this method.
    ///
    /// Reference-data problems (inverted or non-positive range) surface as
    /// `Validation` since they are local input errors, not service failures.
    pub async fn advise(&self, request: AdviceRequest) -> Result<AdvisoryResponse> {
        request.range.validate()?;

        let status = classify(
            Some(request.current_value),
            request.range.min,
            request.range.max,
        );
        let deviation_pct = status.deviation_pct.unwrap_or(0.0);

        let direction = deviation_direction(
            request.current_value,
            request.range.min,
            request.range.max,
        );

        let (analysis, recommendations) = match (status.tier.needs_advisory(), direction) {
            (true, Some(direction)) => {
                let ctx = AdvisoryContext {
                    tank_category: request.tank_category.clone(),
                    quantity: request.quantity.clone(),
                    current_value: request.current_value,
                    optimal_min: request.range.min,
                    optimal_max: request.range.max,
                    deviation_pct,
                    direction,
                    tier: status.tier,
                };
                let result = self.request_advisory(&ctx).await?;
                (result.analysis, result.recommendations)
            }
            _ => (
                IN_RANGE_ANALYSIS.to_string(),
                IN_RANGE_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect(),
            ),
        };

        Ok(AdvisoryResponse {
            quantity: QuantitySummary::from(&request.quantity),
            current_value: request.current_value,
            optimal_range: RangeSummary {
                min: request.range.min,
                max: request.range.max,
            },
            deviation_pct,
            tier: status.tier,
            analysis,
            recommendations,
            disclaimer: DISCLAIMER.to_string(),
        })
    }

    /// Run the remote call and payload validation, collapsing any failure.
    async fn request_advisory(&self, ctx: &AdvisoryContext) -> Result<AdvisoryResult> {
        let completion = CompletionRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(ctx),
            schema_name: RESPONSE_SCHEMA_NAME.to_string(),
            response_schema: advisory_schema(),
            model: None,
            params: Some(ModelParams {
                temperature: Some(0.4),
                max_tokens: Some(700),
                ..Default::default()
            }),
        };

        let outcome = self.backend.complete_advisory(completion).await;
        let result = match outcome.and_then(validate_payload) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(
                    code = err.code(),
                    error = %err,
                    quantity = %ctx.quantity.name,
                    "advisory call failed"
                );
                return Err(AdvisoryError::Unavailable);
            }
        };
        Ok(result)
    }
}

/// Template the user prompt for one out-of-range reading.
fn build_user_prompt(ctx: &AdvisoryContext) -> String {
    format!(
        "Aquarium type: {category}\n\
         Parameter: {full_name} ({name})\n\
         Current value: {value} {unit}\n\
         Optimal range: {min} - {max} {unit}\n\
         Deviation: {deviation:.1}% {direction} the optimal range\n\
         Severity: {tier}\n\n\
         Explain what this deviation means for the tank's inhabitants and give \
         3 to 5 ordered, actionable steps to correct it safely.",
        category = ctx.tank_category,
        full_name = ctx.quantity.full_name,
        name = ctx.quantity.name,
        value = ctx.current_value,
        unit = ctx.quantity.unit,
        min = ctx.optimal_min,
        max = ctx.optimal_max,
        deviation = ctx.deviation_pct,
        direction = ctx.direction,
        tier = ctx.tier,
    )
}

/// Strict response schema: unknown fields from the remote service are
/// rejected, not silently accepted.
fn advisory_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "analysis": { "type": "string" },
            "recommendations": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 3,
                "maxItems": 5
            }
        },
        "required": ["analysis", "recommendations"],
        "additionalProperties": false
    })
}

/// Post-parse validation of the remote payload. Schema enforcement is the
/// service's promise; this is the local check that the promise held.
fn validate_payload(result: AdvisoryResult) -> Result<AdvisoryResult> {
    if result.analysis.trim().is_empty() {
        return Err(AdvisoryError::Parse {
            message: "advisory analysis is empty".to_string(),
            raw: String::new(),
        });
    }
    let count = result.recommendations.len();
    if !(3..=5).contains(&count) {
        return Err(AdvisoryError::Parse {
            message: format!("expected 3 to 5 recommendations, got {}", count),
            raw: String::new(),
        });
    }
    if result.recommendations.iter().any(|r| r.trim().is_empty()) {
        return Err(AdvisoryError::Parse {
            message: "advisory contained an empty recommendation".to_string(),
            raw: String::new(),
        });
    }
    Ok(result)
}
