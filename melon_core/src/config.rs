//! Runtime configuration for the growth engine.
//!
//! These are separate from the TOML-deserialized config in `melon_config`;
//! see `conversions` for the mapping. Defaults come from `melon_config` so the
//! metric set is never fixed inside the algorithms.

use serde::Serialize;

/// How a deviation from the ideal is judged for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Favorability {
    /// `delta >= 0` is favourable.
    #[default]
    HigherBetter,
    /// `delta <= 0` is favourable.
    LowerBetter,
    /// No judgement; every delta counts as favourable.
    #[serde(rename = "none")]
    Neutral,
}

impl Favorability {
    #[inline]
    pub fn is_favorable(self, delta: f64) -> bool {
        match self {
            Self::HigherBetter => delta >= 0.0,
            Self::LowerBetter => delta <= 0.0,
            Self::Neutral => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSpec {
    pub name: String,
    pub label: String,
    pub policy: Favorability,
}

/// Canonical metric ordering plus per-metric policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCatalog {
    metrics: Vec<MetricSpec>,
}

impl MetricCatalog {
    pub fn new(metrics: Vec<MetricSpec>) -> Self {
        Self { metrics }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&MetricSpec> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Policy for `name`; metrics outside the catalog are higher-better.
    pub fn policy(&self, name: &str) -> Favorability {
        self.get(name).map(|m| m.policy).unwrap_or_default()
    }

    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map_or(name, |m| m.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSpec> {
        self.metrics.iter()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Sort key: catalog position first, unknown metrics after in lexical order.
    pub fn order_key<'a>(&self, name: &'a str) -> (usize, &'a str) {
        (self.position(name).unwrap_or(usize::MAX), name)
    }

    /// Order metric names canonically; see `order_key`.
    pub fn sorted<'a, I>(&self, names: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut out: Vec<&'a str> = names.into_iter().collect();
        out.sort_by(|a, b| self.order_key(a).cmp(&self.order_key(b)));
        out.dedup();
        out
    }
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self::from(melon_config::default_metrics().as_slice())
    }
}

/// Growth engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthCfg {
    /// Last DAP (inclusive) of every series. Signed so a negative value from a
    /// caller surfaces as `InvalidHorizon` rather than wrapping.
    pub horizon_days: i64,
    /// Accepted gap between a recomputed delta and an external deviation.
    pub deviation_tolerance: f64,
}

impl Default for GrowthCfg {
    fn default() -> Self {
        Self::from(&melon_config::GrowthCfg::default())
    }
}
