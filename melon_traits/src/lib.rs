//! Collaborator seams for the growth engine.
//!
//! The dashboard backend (GraphQL API, database, flat files) is never reached
//! through a process-wide client. Callers hand an implementation of these
//! traits to `melon_core::report::GrowthReporter` instead.

use melon_config::{DeviceMapRecord, GrowthSummaryRecord, IdealModelRecord};

pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Fitted sigmoid parameters, keyed by `(season, metric_name)`.
pub trait ModelSource {
    /// All ideal models fitted for `season`. A season without any fitted
    /// metric returns an empty list, not an error.
    fn ideal_models(&self, season: &str) -> Result<Vec<IdealModelRecord>, SourceError>;
}

/// Daily growth summaries, keyed by `(melon_id, target_date)`.
pub trait ObservationSource {
    fn growth_summaries(&self, melon_id: &str) -> Result<Vec<GrowthSummaryRecord>, SourceError>;
}

/// Device/camera to melon assignments.
pub trait RegistrySource {
    fn device_maps(&self) -> Result<Vec<DeviceMapRecord>, SourceError>;
}
