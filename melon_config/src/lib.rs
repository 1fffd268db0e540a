#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and boundary payload loaders for the melon growth engine.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Ideal models, growth summaries and the device registry are parsed into
//!   strongly typed records here, so malformed payloads are rejected at the
//!   edge and never reach the growth engine.
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Longest growth horizon accepted from configuration (days).
pub const MAX_CONFIG_HORIZON_DAYS: i64 = 366;

/// Metric name -> measured value. `null` values from the API are kept as `None`.
pub type MetricValues = BTreeMap<String, Option<f64>>;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    #[default]
    HigherBetter,
    LowerBetter,
    None,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MetricCfg {
    pub name: String,
    /// Display label; falls back to `name`.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub policy: Policy,
}

impl MetricCfg {
    fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: Some(label.to_string()),
            policy: Policy::HigherBetter,
        }
    }
}

/// The metric set tracked by the dashboard, in display order.
pub fn default_metrics() -> Vec<MetricCfg> {
    vec![
        MetricCfg::new("estimated_volume_px3", "推定体積"),
        MetricCfg::new("density", "網目密度"),
        MetricCfg::new("branch_points", "分岐点数"),
        MetricCfg::new("h_component_px", "網目横成分"),
        MetricCfg::new("v_component_px", "網目縦成分"),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GrowthCfg {
    /// Last DAP (inclusive) of the ideal trajectory.
    pub horizon_days: i64,
    /// Accepted gap between a recomputed delta and an externally supplied deviation.
    pub deviation_tolerance: f64,
}

impl Default for GrowthCfg {
    fn default() -> Self {
        Self {
            horizon_days: 65,
            deviation_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub growth: GrowthCfg,
    /// Canonical metric ordering and favourability policy.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<MetricCfg>,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            growth: GrowthCfg::default(),
            metrics: default_metrics(),
            logging: Logging::default(),
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Growth
        if self.growth.horizon_days < 0 {
            eyre::bail!("growth.horizon_days must be >= 0");
        }
        if self.growth.horizon_days > MAX_CONFIG_HORIZON_DAYS {
            eyre::bail!("growth.horizon_days must be <= {MAX_CONFIG_HORIZON_DAYS}");
        }
        if !(self.growth.deviation_tolerance.is_finite() && self.growth.deviation_tolerance > 0.0)
        {
            eyre::bail!("growth.deviation_tolerance must be finite and > 0");
        }

        // Metrics
        let mut seen = std::collections::BTreeSet::new();
        for (idx, m) in self.metrics.iter().enumerate() {
            if m.name.trim().is_empty() {
                eyre::bail!("metrics[{idx}].name must not be empty");
            }
            if !seen.insert(m.name.as_str()) {
                eyre::bail!("metrics[{idx}].name '{}' is listed twice", m.name);
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{rot}'");
        }

        Ok(())
    }
}

// ── Boundary records ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ParametersRecord {
    #[serde(rename = "L")]
    pub l: f64,
    pub k: f64,
    pub t0: f64,
}

/// One fitted ideal model as served by `listIdealModels`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IdealModelRecord {
    #[serde(default)]
    pub season: String,
    pub metric_name: String,
    pub parameters: ParametersRecord,
}

/// Ideal model CSV schema.
///
/// Expected headers:
/// season,metric_name,L,k,t0
///
/// Example:
/// season,metric_name,L,k,t0
/// 2025-spring,estimated_volume_px3,1200000,0.18,28
#[derive(Debug, Deserialize, Clone)]
pub struct ModelCsvRow {
    pub season: String,
    pub metric_name: String,
    #[serde(rename = "L")]
    pub l: f64,
    pub k: f64,
    pub t0: f64,
}

impl From<ModelCsvRow> for IdealModelRecord {
    fn from(r: ModelCsvRow) -> Self {
        Self {
            season: r.season,
            metric_name: r.metric_name,
            parameters: ParametersRecord {
                l: r.l,
                k: r.k,
                t0: r.t0,
            },
        }
    }
}

/// One daily growth summary as served by `getGrowthSummaries`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GrowthSummaryRecord {
    #[serde(rename = "melonID")]
    pub melon_id: String,
    #[serde(rename = "targetDate")]
    pub target_date: NaiveDate,
    #[serde(default)]
    pub season: Option<String>,
    /// Days after pollination; negative values are rejected by the deserializer.
    pub dap: u32,
    #[serde(default)]
    pub actual_metrics: MetricValues,
    #[serde(default)]
    pub deviation: Option<MetricValues>,
    #[serde(default)]
    pub ideal_metrics: Option<MetricValues>,
}

/// One device/camera assignment as served by `listDeviceMaps`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DeviceMapRecord {
    #[serde(rename = "deviceID_cameraID")]
    pub device_camera_id: String,
    #[serde(rename = "melonID")]
    pub melon_id: String,
    pub season: String,
    /// Kept verbatim; the growth engine owns date validation.
    #[serde(rename = "pollinationDate")]
    pub pollination_date: String,
}

// ── Loaders ──────────────────────────────────────────────────────────────────

/// Accept a bare JSON array or a page object carrying an `items` array.
fn records_array(value: Value, what: &str) -> eyre::Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => eyre::bail!("{what} payload must be a JSON array or an object with an `items` array"),
        },
        _ => eyre::bail!("{what} payload must be a JSON array or an object with an `items` array"),
    }
}

fn parse_records<T>(s: &str, what: &str) -> eyre::Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    let value: Value =
        serde_json::from_str(s).map_err(|e| eyre::eyre!("parse {what} JSON: {e}"))?;
    let items = records_array(value, what)?;
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let rec = serde_json::from_value::<T>(item)
            .map_err(|e| eyre::eyre!("invalid {what} record {idx}: {e}"))?;
        out.push(rec);
    }
    Ok(out)
}

fn check_finite(what: &str, idx: usize, field: &str, v: f64) -> eyre::Result<()> {
    if !v.is_finite() {
        eyre::bail!("{what} record {idx}: {field} must be finite, got {v}");
    }
    Ok(())
}

fn check_models(models: &[IdealModelRecord]) -> eyre::Result<()> {
    for (idx, m) in models.iter().enumerate() {
        if m.metric_name.trim().is_empty() {
            eyre::bail!("ideal model record {idx}: metric_name must not be empty");
        }
        check_finite("ideal model", idx, "L", m.parameters.l)?;
        check_finite("ideal model", idx, "k", m.parameters.k)?;
        check_finite("ideal model", idx, "t0", m.parameters.t0)?;
    }
    Ok(())
}

/// Parse the `listIdealModels` payload.
pub fn load_models_json(s: &str) -> eyre::Result<Vec<IdealModelRecord>> {
    let models = parse_records::<IdealModelRecord>(s, "ideal model")?;
    check_models(&models)?;
    Ok(models)
}

pub fn load_models_csv(path: &Path) -> eyre::Result<Vec<IdealModelRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open ideal model CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["season", "metric_name", "L", "k", "t0"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "ideal model CSV must have headers 'season,metric_name,L,k,t0', got: {}",
            actual.join(",")
        );
    }

    let mut models = Vec::new();
    for (idx, rec) in rdr.deserialize::<ModelCsvRow>().enumerate() {
        match rec {
            Ok(row) => models.push(IdealModelRecord::from(row)),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    check_models(&models)?;
    Ok(models)
}

/// Load ideal models from a `.csv` or `.json` file.
pub fn load_models_path(path: &Path) -> eyre::Result<Vec<IdealModelRecord>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        return load_models_csv(path);
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read ideal models {:?}: {}", path, e))?;
    load_models_json(&text)
}

/// Parse the `getGrowthSummaries` payload, returned sorted by `targetDate`.
pub fn load_summaries_json(s: &str) -> eyre::Result<Vec<GrowthSummaryRecord>> {
    let mut items = parse_records::<GrowthSummaryRecord>(s, "growth summary")?;
    for (idx, item) in items.iter().enumerate() {
        if item.melon_id.trim().is_empty() {
            eyre::bail!("growth summary record {idx}: melonID must not be empty");
        }
        let maps = [
            Some(&item.actual_metrics),
            item.deviation.as_ref(),
            item.ideal_metrics.as_ref(),
        ];
        for (name, v) in maps.into_iter().flatten().flat_map(|m| m.iter()) {
            if let Some(v) = v {
                check_finite("growth summary", idx, name, *v)?;
            }
        }
    }
    // Stable: same-day records keep their payload order.
    items.sort_by_key(|i| i.target_date);
    Ok(items)
}

pub fn load_summaries_path(path: &Path) -> eyre::Result<Vec<GrowthSummaryRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read growth summaries {:?}: {}", path, e))?;
    load_summaries_json(&text)
}

/// Parse the `listDeviceMaps` payload.
pub fn load_registry_json(s: &str) -> eyre::Result<Vec<DeviceMapRecord>> {
    let maps = parse_records::<DeviceMapRecord>(s, "device map")?;
    for (idx, m) in maps.iter().enumerate() {
        if m.melon_id.trim().is_empty() {
            eyre::bail!("device map record {idx}: melonID must not be empty");
        }
    }
    Ok(maps)
}

pub fn load_registry_path(path: &Path) -> eyre::Result<Vec<DeviceMapRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read device registry {:?}: {}", path, e))?;
    load_registry_json(&text)
}
