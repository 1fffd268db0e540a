//! Signed deviation of actual measurements from the ideal trajectory.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::{Favorability, MetricCatalog};
use crate::series::{SeriesSet, ideal_values};
use crate::types::{ModelSet, Observation};

/// Where the actual value sits relative to the ideal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthSignal {
    Above,
    OnTarget,
    Below,
}

impl HealthSignal {
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Above
        } else if delta < 0.0 {
            Self::Below
        } else {
            Self::OnTarget
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationRecord {
    pub metric: String,
    pub actual: f64,
    pub ideal: f64,
    /// `actual - ideal`
    pub delta: f64,
    pub favorable: bool,
    pub signal: HealthSignal,
}

impl DeviationRecord {
    pub fn new(metric: impl Into<String>, actual: f64, ideal: f64, policy: Favorability) -> Self {
        let delta = actual - ideal;
        Self {
            metric: metric.into(),
            actual,
            ideal,
            delta,
            favorable: policy.is_favorable(delta),
            signal: HealthSignal::from_delta(delta),
        }
    }

    /// Two-decimal delta with an explicit `+` for positive values.
    pub fn signed_delta(&self) -> String {
        // -0.0 would otherwise print as "-0.00"
        let d = if self.delta == 0.0 { 0.0 } else { self.delta };
        let sign = if d > 0.0 { "+" } else { "" };
        format!("{sign}{d:.2}")
    }
}

/// A recomputed delta that disagrees with the deviation supplied upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviationMismatch {
    pub metric: String,
    pub computed: f64,
    pub external: f64,
}

/// Compare `actual` against `ideal` per metric.
///
/// Metrics without an ideal value are skipped. Favourability follows the
/// catalog policy (higher-better for metrics the catalog does not list).
/// Output follows canonical catalog order, unknown metrics last.
pub fn compute_deviations(
    actual: &BTreeMap<String, f64>,
    ideal: &BTreeMap<String, Option<f64>>,
    catalog: &MetricCatalog,
) -> Vec<DeviationRecord> {
    catalog
        .sorted(actual.keys().map(String::as_str))
        .into_iter()
        .filter_map(|metric| {
            let expected = ideal.get(metric).copied().flatten()?;
            Some(DeviationRecord::new(
                metric,
                actual[metric],
                expected,
                catalog.policy(metric),
            ))
        })
        .collect()
}

fn mismatches(
    records: &[DeviationRecord],
    external: &BTreeMap<String, f64>,
    tolerance: f64,
    computed: fn(&DeviationRecord) -> f64,
) -> Vec<DeviationMismatch> {
    records
        .iter()
        .filter_map(|r| {
            let ext = *external.get(&r.metric)?;
            let value = computed(r);
            ((value - ext).abs() > tolerance).then(|| DeviationMismatch {
                metric: r.metric.clone(),
                computed: value,
                external: ext,
            })
        })
        .collect()
}

/// Metrics whose recomputed delta differs from `external` by more than
/// `tolerance`. Metrics missing on either side are not compared.
pub fn reconcile(
    records: &[DeviationRecord],
    external: &BTreeMap<String, f64>,
    tolerance: f64,
) -> Vec<DeviationMismatch> {
    mismatches(records, external, tolerance, |r| r.delta)
}

/// Same as `reconcile`, against upstream ideal values instead of deltas.
pub fn reconcile_ideals(
    records: &[DeviationRecord],
    external: &BTreeMap<String, f64>,
    tolerance: f64,
) -> Vec<DeviationMismatch> {
    mismatches(records, external, tolerance, |r| r.ideal)
}

/// `compute_deviations` bound to a metric catalog.
#[derive(Debug, Clone, Default)]
pub struct DeviationComputer {
    catalog: MetricCatalog,
}

impl DeviationComputer {
    pub fn new(catalog: MetricCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn compute(
        &self,
        actual: &BTreeMap<String, f64>,
        ideal: &BTreeMap<String, Option<f64>>,
    ) -> Vec<DeviationRecord> {
        compute_deviations(actual, ideal, &self.catalog)
    }

    /// Deviations for the pair aligned at `dap` in a built series set.
    pub fn for_day(&self, set: &SeriesSet, dap: u32) -> Vec<DeviationRecord> {
        self.compute(&set.actual_at(dap), &set.ideal_at(dap))
    }

    /// Deviations for one observation, evaluating the models at its DAP.
    pub fn for_observation(&self, obs: &Observation, models: &ModelSet) -> Vec<DeviationRecord> {
        self.compute(&obs.metrics, &ideal_values(models, obs.dap))
    }
}
