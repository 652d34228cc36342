//! Domain types for water-chemistry monitoring
//!
//! Reference data (tracked quantities, optimal ranges), measurement records,
//! and the computed view-models the dashboard and advisory endpoints serve.
//! Everything here is serde-serializable; the view types use the camelCase
//! field names the JSON boundary promises.

use crate::errors::{AdvisoryError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, unit-bearing chemical or physical parameter (e.g. pH, ammonia).
///
/// Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedQuantity {
    pub id: Uuid,
    /// Short code shown in compact UI ("NH3", "pH").
    pub name: String,
    /// Full human-readable name ("Ammonia", "Acidity").
    pub full_name: String,
    pub unit: String,
}

/// The acceptable [min, max] band for a quantity within a tank category.
///
/// One range per (category, quantity) pair; `min < max` is enforced where the
/// reference data enters the system, not re-checked on every read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalRange {
    pub quantity_id: Uuid,
    pub min: f64,
    pub max: f64,
}

impl OptimalRange {
    /// Validate reference data at the boundary.
    ///
    /// Deviation percentages divide by `min` for below-range values, so a
    /// non-positive `min` would produce meaningless infinities downstream.
    pub fn validate(&self) -> Result<()> {
        if self.min >= self.max {
            return Err(AdvisoryError::Validation(format!(
                "optimal range min {} must be below max {}",
                self.min, self.max
            )));
        }
        if self.min <= 0.0 {
            return Err(AdvisoryError::Validation(format!(
                "optimal range min must be positive, got {}",
                self.min
            )));
        }
        Ok(())
    }
}

/// A single water-chemistry observation. Read-only input to this crate;
/// created and owned by the measurement-entry flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub id: Uuid,
    pub tank_id: Uuid,
    pub quantity_id: Uuid,
    /// Observed value, non-negative by upstream validation.
    pub value: f64,
    /// When the water was actually measured.
    pub measured_at: DateTime<Utc>,
    pub note: Option<String>,
    /// When the record was created; drives the latest-wins reduction.
    pub created_at: DateTime<Utc>,
}

/// Severity classification of a measurement against its optimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Within range or deviating less than 10%.
    Normal,

    /// Deviation in [10%, 20%).
    Warning,

    /// Deviation of 20% or more.
    Critical,

    /// No measurement exists for the quantity.
    NoData,
}

impl Tier {
    /// Sort priority: most urgent first.
    pub fn priority(&self) -> u8 {
        match self {
            Tier::Critical => 0,
            Tier::Warning => 1,
            Tier::Normal => 2,
            Tier::NoData => 3,
        }
    }

    /// Whether this tier warrants an advisory call.
    pub fn needs_advisory(&self) -> bool {
        matches!(self, Tier::Warning | Tier::Critical)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Normal => "normal",
            Tier::Warning => "warning",
            Tier::Critical => "critical",
            Tier::NoData => "no_data",
        };
        write!(f, "{}", s)
    }
}

/// Result of classifying one value against one range. Computed, never stored.
///
/// Invariant: `deviation_pct` is `None` exactly when `tier` is `NoData`;
/// otherwise it is >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusResult {
    pub tier: Tier,
    pub deviation_pct: Option<f64>,
}

/// Which side of the optimal range a deviating value sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Below,
    Above,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Below => write!(f, "below"),
            Direction::Above => write!(f, "above"),
        }
    }
}

/// Per-quantity dashboard view: identity, latest reading, range, and status.
///
/// Ephemeral; rebuilt on every aggregation call and exclusively owned by the
/// caller. Field names match the JSON contract of the dashboard endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterStatusView {
    pub quantity_id: Uuid,
    pub name: String,
    pub full_name: String,
    pub unit: String,
    pub current_value: Option<f64>,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub deviation_pct: Option<f64>,
    pub tier: Tier,
    pub measurement_time: Option<DateTime<Utc>>,
}

/// Input to the advisory prompt: everything the model needs to narrate one
/// out-of-range quantity. Only `Warning`/`Critical` tiers reach this type.
#[derive(Debug, Clone)]
pub struct AdvisoryContext {
    pub tank_category: String,
    pub quantity: TrackedQuantity,
    pub current_value: f64,
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub deviation_pct: f64,
    pub direction: Direction,
    pub tier: Tier,
}

/// The structured payload parsed from the remote advisory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvisoryResult {
    pub analysis: String,
    /// 3 to 5 actionable steps, ordered by priority.
    pub recommendations: Vec<String>,
}

/// Summary of the quantity identity echoed back in advisory responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitySummary {
    pub id: Uuid,
    pub name: String,
    pub full_name: String,
    pub unit: String,
}

impl From<&TrackedQuantity> for QuantitySummary {
    fn from(q: &TrackedQuantity) -> Self {
        Self {
            id: q.id,
            name: q.name.clone(),
            full_name: q.full_name.clone(),
            unit: q.unit.clone(),
        }
    }
}

/// Optimal range as exposed on the advisory boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub min: f64,
    pub max: f64,
}

/// Full advisory response served over the request/response boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResponse {
    pub quantity: QuantitySummary,
    pub current_value: f64,
    pub optimal_range: RangeSummary,
    pub deviation_pct: f64,
    /// Restricted to `warning`/`critical` by the orchestrator.
    pub tier: Tier,
    pub analysis: String,
    pub recommendations: Vec<String>,
    pub disclaimer: String,
}
