//! `From` implementations bridging `melon_config` types to `melon_core` types.

use crate::config::{Favorability, GrowthCfg, MetricCatalog, MetricSpec};
use crate::error::{GrowthError, Result};
use crate::registry::MelonInfo;
use crate::types::{ModelParameters, ModelSet, Observation};

// ── GrowthCfg ────────────────────────────────────────────────────────────────

impl From<&melon_config::GrowthCfg> for GrowthCfg {
    fn from(c: &melon_config::GrowthCfg) -> Self {
        Self {
            horizon_days: c.horizon_days,
            deviation_tolerance: c.deviation_tolerance,
        }
    }
}

// ── Metric catalog ───────────────────────────────────────────────────────────

impl From<melon_config::Policy> for Favorability {
    fn from(p: melon_config::Policy) -> Self {
        match p {
            melon_config::Policy::HigherBetter => Self::HigherBetter,
            melon_config::Policy::LowerBetter => Self::LowerBetter,
            melon_config::Policy::None => Self::Neutral,
        }
    }
}

impl From<&melon_config::MetricCfg> for MetricSpec {
    fn from(c: &melon_config::MetricCfg) -> Self {
        Self {
            name: c.name.clone(),
            label: c.label.clone().unwrap_or_else(|| c.name.clone()),
            policy: c.policy.into(),
        }
    }
}

impl From<&[melon_config::MetricCfg]> for MetricCatalog {
    fn from(c: &[melon_config::MetricCfg]) -> Self {
        Self::new(c.iter().map(MetricSpec::from).collect())
    }
}

impl From<&melon_config::Config> for MetricCatalog {
    fn from(c: &melon_config::Config) -> Self {
        Self::from(c.metrics.as_slice())
    }
}

// ── Models ───────────────────────────────────────────────────────────────────

impl From<&melon_config::ParametersRecord> for ModelParameters {
    fn from(p: &melon_config::ParametersRecord) -> Self {
        Self::new(p.l, p.k, p.t0)
    }
}

/// Metric -> parameters for one season. A metric listed twice keeps the last
/// record.
pub fn model_set(records: &[melon_config::IdealModelRecord]) -> Result<ModelSet> {
    let mut set = ModelSet::new();
    for r in records {
        let params = ModelParameters::from(&r.parameters);
        params.validate(&r.metric_name)?;
        set.insert(r.metric_name.clone(), Some(params));
    }
    Ok(set)
}

// ── Observations ─────────────────────────────────────────────────────────────

impl TryFrom<&melon_config::GrowthSummaryRecord> for Observation {
    type Error = GrowthError;

    /// `null` metric values are dropped; a non-finite value fails.
    fn try_from(r: &melon_config::GrowthSummaryRecord) -> Result<Self> {
        let mut obs = Self::new(r.melon_id.clone(), r.target_date, r.dap);
        for (name, value) in &r.actual_metrics {
            let Some(v) = *value else { continue };
            if !v.is_finite() {
                return Err(GrowthError::InvalidObservation {
                    dap: r.dap,
                    metric: name.clone(),
                });
            }
            obs.metrics.insert(name.clone(), v);
        }
        if let Some(dev) = &r.deviation {
            for (name, value) in dev {
                if let Some(v) = *value {
                    obs = obs.with_deviation(name.clone(), v);
                }
            }
        }
        if let Some(ideal) = &r.ideal_metrics {
            for (name, value) in ideal {
                if let Some(v) = *value {
                    obs = obs.with_ideal(name.clone(), v);
                }
            }
        }
        Ok(obs)
    }
}

// ── Registry ─────────────────────────────────────────────────────────────────

impl From<&melon_config::DeviceMapRecord> for MelonInfo {
    fn from(r: &melon_config::DeviceMapRecord) -> Self {
        Self {
            id: r.melon_id.clone(),
            season: r.season.clone(),
            pollination_date: r.pollination_date.clone(),
            device_camera_id: r.device_camera_id.clone(),
        }
    }
}
