use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::series::MAX_HORIZON_DAYS;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrowthError {
    #[error("invalid model parameter for {metric}: {field} = {value} is not finite")]
    InvalidParameter {
        metric: String,
        field: &'static str,
        value: f64,
    },
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid horizon: {0} days (expected 0..={max})", max = MAX_HORIZON_DAYS)]
    InvalidHorizon(i64),
    #[error("invalid observation at DAP {dap}: {metric} is not finite")]
    InvalidObservation { dap: u32, metric: String },
    #[error("unknown melon: {0}")]
    UnknownMelon(String),
    #[error("data source error: {0}")]
    Source(String),
}

/// Non-fatal findings collected while building; the affected data is still
/// carried (or skipped) as described per variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthWarning {
    /// Observation metric outside the canonical metric set. The value is kept.
    MetricMismatch { metric: String, first_dap: u32 },
    /// A second observation for an already aligned DAP. The later one is ignored.
    DuplicateDap { dap: u32 },
    /// Observation past the horizon. Not aligned into any series.
    BeyondHorizon { dap: u32 },
    /// Stated DAP disagrees with `target_date - pollination_date`.
    DapMismatch {
        target_date: NaiveDate,
        stated: u32,
        derived: i64,
    },
}

impl std::fmt::Display for GrowthWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetricMismatch { metric, first_dap } => {
                write!(f, "metric '{metric}' (first seen at DAP {first_dap}) is not in the canonical metric set")
            }
            Self::DuplicateDap { dap } => {
                write!(f, "more than one observation at DAP {dap}; keeping the first")
            }
            Self::BeyondHorizon { dap } => {
                write!(f, "observation at DAP {dap} lies beyond the horizon")
            }
            Self::DapMismatch {
                target_date,
                stated,
                derived,
            } => write!(
                f,
                "observation on {target_date} states DAP {stated} but the pollination date gives {derived}"
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, GrowthError>;
