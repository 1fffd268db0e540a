//! Test and helper mocks for melon_core

use melon_config::{DeviceMapRecord, GrowthSummaryRecord, IdealModelRecord};
use melon_traits::{ModelSource, ObservationSource, RegistrySource, SourceError};

/// A source that always errors; useful to check that collaborator failures
/// surface as `GrowthError::Source` instead of an empty report.
pub struct UnavailableSource;

fn unavailable() -> SourceError {
    Box::new(std::io::Error::other("source unavailable"))
}

impl ModelSource for UnavailableSource {
    fn ideal_models(&self, _season: &str) -> Result<Vec<IdealModelRecord>, SourceError> {
        Err(unavailable())
    }
}

impl ObservationSource for UnavailableSource {
    fn growth_summaries(&self, _melon_id: &str) -> Result<Vec<GrowthSummaryRecord>, SourceError> {
        Err(unavailable())
    }
}

impl RegistrySource for UnavailableSource {
    fn device_maps(&self) -> Result<Vec<DeviceMapRecord>, SourceError> {
        Err(unavailable())
    }
}
