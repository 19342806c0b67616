//! Region and zone catalog
//!
//! Lists the regions (and zones) a project can place agents in. Deprecated
//! entries are dropped and the rest is sorted by name, so callers see the
//! same order whatever order the API answered in.

use super::self_link::{region_from_zone, short_name_from_reference};
use crate::error::ComputeError;
use crate::gcp::client::ComputeClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Compute Engine region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RegionWire")]
pub struct Region {
    pub name: String,
    /// Deprecation marker, e.g. `DEPRECATED`; absent for usable regions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    /// Short names of the zones in this region
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deprecated: None,
            zones: Vec::new(),
        }
    }

    /// Mark the region with a deprecation state
    pub fn with_deprecation(mut self, state: impl Into<String>) -> Self {
        self.deprecated = Some(state.into());
        self
    }

    /// True iff the deprecation marker is present and non-empty
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A Compute Engine zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ZoneWire")]
pub struct Zone {
    pub name: String,
    /// Short name of the owning region
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
}

impl Zone {
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// `deprecated` object as the API returns it
#[derive(Debug, Default, Deserialize)]
struct DeprecationStatus {
    #[serde(default)]
    state: Option<String>,
    /// Older responses carry the marker here instead of in `state`
    #[serde(default)]
    deprecated: Option<String>,
}

/// `deprecated` as either the API object or the flattened marker this
/// crate serializes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeprecationField {
    Status(DeprecationStatus),
    Marker(String),
}

impl DeprecationField {
    fn marker(self) -> Option<String> {
        match self {
            Self::Status(status) => [status.state, status.deprecated]
                .into_iter()
                .flatten()
                .find(|s| !s.is_empty()),
            Self::Marker(marker) => Some(marker).filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegionWire {
    #[serde(default)]
    name: String,
    #[serde(default)]
    deprecated: Option<DeprecationField>,
    #[serde(default)]
    zones: Vec<String>,
}

impl From<RegionWire> for Region {
    fn from(wire: RegionWire) -> Self {
        Self {
            name: wire.name,
            deprecated: wire.deprecated.and_then(DeprecationField::marker),
            zones: wire
                .zones
                .iter()
                .map(|z| short_name_from_reference(z))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ZoneWire {
    #[serde(default)]
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    deprecated: Option<DeprecationField>,
}

impl From<ZoneWire> for Zone {
    fn from(wire: ZoneWire) -> Self {
        // Zones without a region link belong to the region their name encodes
        let region = if wire.region.is_empty() {
            region_from_zone(&wire.name)
        } else {
            short_name_from_reference(&wire.region)
        };
        Self {
            region,
            name: wire.name,
            deprecated: wire.deprecated.and_then(DeprecationField::marker),
        }
    }
}

/// Drop deprecated and unnamed regions, then sort by name (byte order)
pub fn available_regions(regions: Vec<Region>) -> Vec<Region> {
    let mut available: Vec<Region> = regions
        .into_iter()
        .filter(|r| {
            if r.name.is_empty() {
                tracing::warn!("Skipping region without a name");
                return false;
            }
            !r.is_deprecated()
        })
        .collect();
    available.sort_by(|a, b| a.name.cmp(&b.name));
    available
}

fn require_project(project_id: &str) -> Result<&str, ComputeError> {
    let project_id = project_id.trim();
    if project_id.is_empty() {
        return Err(ComputeError::Configuration(
            "project id must not be empty".to_string(),
        ));
    }
    Ok(project_id)
}

fn decode_items<T: serde::de::DeserializeOwned>(
    items: Vec<Value>,
    kind: &str,
) -> Result<Vec<T>, ComputeError> {
    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| ComputeError::transport(format!("malformed {} entry: {}", kind, e)))
        })
        .collect()
}

/// Source of usable regions for a project
#[async_trait]
pub trait RegionCatalog: Send + Sync {
    /// Non-deprecated regions of `project_id`, sorted by name
    async fn list_available_regions(&self, project_id: &str) -> Result<Vec<Region>, ComputeError>;
}

#[async_trait]
impl RegionCatalog for ComputeClient {
    async fn list_available_regions(&self, project_id: &str) -> Result<Vec<Region>, ComputeError> {
        let project_id = require_project(project_id)?;

        let items = self.list_items(&self.regions_url(project_id)).await?;
        let total = items.len();
        let regions = available_regions(decode_items(items, "region")?);

        tracing::debug!(
            "Project {}: {} of {} regions available",
            project_id,
            regions.len(),
            total
        );
        Ok(regions)
    }
}

impl ComputeClient {
    /// Available regions of the configured project
    pub async fn regions(&self) -> Result<Vec<Region>, ComputeError> {
        self.list_available_regions(self.project_id()).await
    }

    /// Non-deprecated zones of `project_id` in `region`, sorted by name
    pub async fn list_available_zones(
        &self,
        project_id: &str,
        region: &str,
    ) -> Result<Vec<Zone>, ComputeError> {
        let project_id = require_project(project_id)?;
        let region = short_name_from_reference(region);

        let items = self.list_items(&self.zones_url(project_id)).await?;
        let mut zones: Vec<Zone> = decode_items::<Zone>(items, "zone")?
            .into_iter()
            .filter(|z| !z.name.is_empty() && !z.is_deprecated() && z.region == region)
            .collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(zones)
    }
}
