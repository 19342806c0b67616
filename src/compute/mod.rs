//! Compute Engine domain types
//!
//! - [`regions`] - region/zone catalog with deprecation filtering
//! - [`self_link`] - short names from resource self-links

pub mod regions;
pub mod self_link;

pub use regions::{available_regions, Region, RegionCatalog, Zone};
pub use self_link::{region_from_zone, short_name_from_reference, SelfLink};
