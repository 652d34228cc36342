//! Measurement aggregation
//!
//! Reduces a time-series of measurement records to one "current" reading per
//! tracked quantity, joins the result against the reference ranges, and
//! produces the severity-ordered dashboard view. Pure given its inputs; the
//! storage layer fetches both lists.

use crate::status::classify;
use crate::types::{MeasurementRecord, OptimalRange, ParameterStatusView, TrackedQuantity};
use std::collections::HashMap;
use uuid::Uuid;

/// An optimal range joined with the identity of the quantity it bounds.
///
/// Produced by the storage layer for the tank's category; one entry per
/// tracked quantity applicable to that category.
#[derive(Debug, Clone)]
pub struct QuantityRange {
    pub quantity: TrackedQuantity,
    pub range: OptimalRange,
}

/// Reduce measurements to the latest record per quantity.
///
/// Latest-wins: the record with the greatest `created_at` is the current one.
/// Precondition: `measurements` is sorted descending by `created_at`; the
/// fold keeps the first occurrence per `quantity_id` and skips the rest.
fn latest_per_quantity(
    measurements: &[MeasurementRecord],
) -> HashMap<Uuid, &MeasurementRecord> {
    measurements.iter().fold(HashMap::new(), |mut latest, record| {
        latest.entry(record.quantity_id).or_insert(record);
        latest
    })
}

/// Build the per-quantity status views for a dashboard.
///
/// Precondition: `measurements` sorted descending by `created_at` (the query
/// layer orders them this way). Use [`aggregate_unsorted`] when that cannot
/// be guaranteed.
///
/// Output cardinality follows `ranges`, not measurements: a quantity with a
/// range but no record still appears, with tier `no_data`. Views are sorted
/// most urgent first (critical, warning, normal, no_data), ties broken by
/// quantity short name ascending. Empty `ranges` yields an empty list.
pub fn aggregate(
    measurements: &[MeasurementRecord],
    ranges: &[QuantityRange],
) -> Vec<ParameterStatusView> {
    let latest = latest_per_quantity(measurements);

    let mut views: Vec<ParameterStatusView> = ranges
        .iter()
        .map(|entry| {
            let record = latest.get(&entry.quantity.id).copied();
            let status = classify(
                record.map(|r| r.value),
                entry.range.min,
                entry.range.max,
            );
            ParameterStatusView {
                quantity_id: entry.quantity.id,
                name: entry.quantity.name.clone(),
                full_name: entry.quantity.full_name.clone(),
                unit: entry.quantity.unit.clone(),
                current_value: record.map(|r| r.value),
                optimal_min: entry.range.min,
                optimal_max: entry.range.max,
                deviation_pct: status.deviation_pct,
                tier: status.tier,
                measurement_time: record.map(|r| r.measured_at),
            }
        })
        .collect();

    views.sort_by(|a, b| {
        a.tier
            .priority()
            .cmp(&b.tier.priority())
            .then_with(|| a.name.cmp(&b.name))
    });

    views
}

/// Like [`aggregate`], for callers that cannot guarantee input ordering.
///
/// Sorts a copy of the measurements descending by `created_at` first.
pub fn aggregate_unsorted(
    measurements: &[MeasurementRecord],
    ranges: &[QuantityRange],
) -> Vec<ParameterStatusView> {
    let mut sorted: Vec<MeasurementRecord> = measurements.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    aggregate(&sorted, ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tier;
    use chrono::{Duration, Utc};

    fn quantity(name: &str, full_name: &str) -> TrackedQuantity {
        TrackedQuantity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            full_name: full_name.to_string(),
            unit: "mg/L".to_string(),
        }
    }

    fn entry(q: &TrackedQuantity, min: f64, max: f64) -> QuantityRange {
        QuantityRange {
            quantity: q.clone(),
            range: OptimalRange {
                quantity_id: q.id,
                min,
                max,
            },
        }
    }

    fn record(q: &TrackedQuantity, value: f64, age_mins: i64) -> MeasurementRecord {
        let created = Utc::now() - Duration::minutes(age_mins);
        MeasurementRecord {
            id: Uuid::new_v4(),
            tank_id: Uuid::new_v4(),
            quantity_id: q.id,
            value,
            measured_at: created,
            note: None,
            created_at: created,
        }
    }

    #[test]
    fn test_latest_wins_per_quantity() {
        let a = quantity("NH3", "Ammonia");
        let b = quantity("NO2", "Nitrite");
        // Sorted descending by created_at: newest first.
        let measurements = vec![record(&a, 10.0, 1), record(&a, 5.0, 60), record(&b, 1.0, 120)];
        let ranges = vec![entry(&a, 8.0, 12.0), entry(&b, 0.5, 1.5)];

        let views = aggregate(&measurements, &ranges);
        assert_eq!(views.len(), 2);

        let view_a = views.iter().find(|v| v.quantity_id == a.id).unwrap();
        assert_eq!(view_a.current_value, Some(10.0));

        let view_b = views.iter().find(|v| v.quantity_id == b.id).unwrap();
        assert_eq!(view_b.current_value, Some(1.0));
    }

    #[test]
    fn test_unmeasured_quantity_appears_as_no_data() {
        let a = quantity("NH3", "Ammonia");
        let c = quantity("KH", "Carbonate hardness");
        let measurements = vec![record(&a, 10.0, 1)];
        let ranges = vec![entry(&a, 8.0, 12.0), entry(&c, 4.0, 8.0)];

        let views = aggregate(&measurements, &ranges);
        let view_c = views.iter().find(|v| v.quantity_id == c.id).unwrap();
        assert_eq!(view_c.tier, Tier::NoData);
        assert_eq!(view_c.current_value, None);
        assert_eq!(view_c.deviation_pct, None);
        assert_eq!(view_c.measurement_time, None);
    }

    #[test]
    fn test_sorted_by_severity_then_name() {
        let z = quantity("Z", "Zinc");
        let b = quantity("B", "Boron");
        let a = quantity("A", "Alkalinity");
        // Z in range (normal), B 50% below min (critical), A 10% below (warning).
        let measurements = vec![
            record(&z, 5.0, 1),
            record(&b, 1.0, 2),
            record(&a, 0.9, 3),
        ];
        let ranges = vec![entry(&z, 4.0, 6.0), entry(&b, 2.0, 3.0), entry(&a, 1.0, 1.5)];

        let views = aggregate(&measurements, &ranges);
        let order: Vec<(&str, Tier)> = views
            .iter()
            .map(|v| (v.name.as_str(), v.tier))
            .collect();
        assert_eq!(
            order,
            vec![
                ("B", Tier::Critical),
                ("A", Tier::Warning),
                ("Z", Tier::Normal)
            ]
        );
    }

    #[test]
    fn test_ties_break_by_name_within_tier() {
        let m = quantity("Mg", "Magnesium");
        let ca = quantity("Ca", "Calcium");
        let ranges = vec![entry(&m, 1.0, 2.0), entry(&ca, 1.0, 2.0)];

        let views = aggregate(&[], &ranges);
        assert_eq!(views[0].name, "Ca");
        assert_eq!(views[1].name, "Mg");
        assert!(views.iter().all(|v| v.tier == Tier::NoData));
    }

    #[test]
    fn test_empty_ranges_yield_empty_output() {
        let a = quantity("NH3", "Ammonia");
        let measurements = vec![record(&a, 10.0, 1)];
        assert!(aggregate(&measurements, &[]).is_empty());
    }

    #[test]
    fn test_unsorted_input_still_picks_latest() {
        let a = quantity("NH3", "Ammonia");
        // Oldest first on purpose.
        let measurements = vec![record(&a, 5.0, 60), record(&a, 10.0, 1)];
        let ranges = vec![entry(&a, 8.0, 12.0)];

        let views = aggregate_unsorted(&measurements, &ranges);
        assert_eq!(views[0].current_value, Some(10.0));
    }
}
