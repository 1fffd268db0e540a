//! In-memory collaborator sources, e.g. for payloads already loaded from disk.

use melon_config::{DeviceMapRecord, GrowthSummaryRecord, IdealModelRecord};
use melon_traits::{ModelSource, ObservationSource, RegistrySource, SourceError};

/// Ideal models for any number of seasons.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModels {
    records: Vec<IdealModelRecord>,
}

impl InMemoryModels {
    pub fn new(records: Vec<IdealModelRecord>) -> Self {
        Self { records }
    }
}

impl ModelSource for InMemoryModels {
    /// Records with an empty season apply to every season; an empty
    /// `season` selects every record.
    fn ideal_models(&self, season: &str) -> Result<Vec<IdealModelRecord>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|r| season.is_empty() || r.season.is_empty() || r.season == season)
            .cloned()
            .collect())
    }
}

/// Growth summaries for any number of melons.
#[derive(Debug, Clone, Default)]
pub struct InMemorySummaries {
    records: Vec<GrowthSummaryRecord>,
}

impl InMemorySummaries {
    pub fn new(records: Vec<GrowthSummaryRecord>) -> Self {
        Self { records }
    }
}

impl ObservationSource for InMemorySummaries {
    fn growth_summaries(&self, melon_id: &str) -> Result<Vec<GrowthSummaryRecord>, SourceError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.melon_id == melon_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    records: Vec<DeviceMapRecord>,
}

impl InMemoryRegistry {
    pub fn new(records: Vec<DeviceMapRecord>) -> Self {
        Self { records }
    }
}

impl RegistrySource for InMemoryRegistry {
    fn device_maps(&self) -> Result<Vec<DeviceMapRecord>, SourceError> {
        Ok(self.records.clone())
    }
}
