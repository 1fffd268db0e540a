//! Distinct melons from the device/camera registry.

use serde::Serialize;

use crate::error::{GrowthError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MelonInfo {
    pub id: String,
    pub season: String,
    /// Unparsed; `GrowthSeriesBuilder::build` validates it.
    pub pollination_date: String,
    pub device_camera_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MelonRegistry {
    melons: Vec<MelonInfo>,
}

impl MelonRegistry {
    /// One entry per melon id. The first occurrence fixes the position, the
    /// last occurrence supplies the fields.
    pub fn from_device_maps(records: &[melon_config::DeviceMapRecord]) -> Self {
        let mut melons: Vec<MelonInfo> = Vec::new();
        for r in records {
            let info = MelonInfo::from(r);
            match melons.iter_mut().find(|m| m.id == info.id) {
                Some(existing) => *existing = info,
                None => melons.push(info),
            }
        }
        Self { melons }
    }

    pub fn get(&self, id: &str) -> Option<&MelonInfo> {
        self.melons.iter().find(|m| m.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&MelonInfo> {
        self.get(id)
            .ok_or_else(|| GrowthError::UnknownMelon(id.to_string()))
    }

    /// Default selection: the first melon listed.
    pub fn first(&self) -> Option<&MelonInfo> {
        self.melons.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MelonInfo> {
        self.melons.iter()
    }

    pub fn len(&self) -> usize {
        self.melons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.melons.is_empty()
    }
}
