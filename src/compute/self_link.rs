//! Self-link parsing
//!
//! The Compute API identifies resources by fully-qualified URLs such as
//! `https://www.googleapis.com/compute/v1/projects/my-project/zones/us-central1-a`.
//! Configuration and logs use the short name at the end.

use crate::error::ComputeError;

/// Extract the short name from a self-link, or return a bare name unchanged.
///
/// Splits on `/` and returns the final segment when there is more than one.
/// Never fails: a reference ending in `/` yields the empty string, as does
/// the empty string itself. Applying it to its own output is a no-op.
pub fn short_name_from_reference(reference: &str) -> String {
    match reference.rsplit_once('/') {
        Some((_, last)) => last.to_string(),
        None => reference.to_string(),
    }
}

/// Region a zone belongs to, e.g. `us-central1-a` -> `us-central1`
///
/// Accepts a zone self-link as well as a short zone name.
pub fn region_from_zone(zone: &str) -> String {
    let zone = short_name_from_reference(zone);
    match zone.rsplit_once('-') {
        Some((region, _)) if !region.is_empty() => region.to_string(),
        _ => zone,
    }
}

/// Structured view of a resource reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfLink {
    /// Project segment, when the reference is scoped to one
    pub project: Option<String>,
    /// Collection the resource lives in (`zones`, `regions`, `instances`, ...)
    pub collection: Option<String>,
    /// Short resource name
    pub name: String,
}

impl SelfLink {
    /// Strict parse of a self-link or partial path.
    ///
    /// Unlike [`short_name_from_reference`], a reference without a non-empty
    /// terminal segment is rejected with [`ComputeError::Parse`].
    pub fn parse(reference: &str) -> Result<Self, ComputeError> {
        let segments: Vec<&str> = reference.split('/').collect();
        let name = match segments.last() {
            Some(last) if !last.is_empty() => last.to_string(),
            _ => return Err(ComputeError::Parse(reference.to_string())),
        };

        let project = segments
            .windows(2)
            .find(|pair| pair[0] == "projects" && !pair[1].is_empty())
            .map(|pair| pair[1].to_string());

        let collection = if segments.len() > 1 {
            Some(segments[segments.len() - 2])
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        } else {
            None
        };

        Ok(Self {
            project,
            collection,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE_LINK: &str =
        "https://www.googleapis.com/compute/v1/projects/evandbrown17/zones/asia-east1-a";

    #[test]
    fn test_short_name_from_self_link() {
        assert_eq!(short_name_from_reference(ZONE_LINK), "asia-east1-a");
    }

    #[test]
    fn test_short_name_passes_bare_name_through() {
        assert_eq!(short_name_from_reference("asia-east1-a"), "asia-east1-a");
    }

    #[test]
    fn test_short_name_is_idempotent() {
        let once = short_name_from_reference(ZONE_LINK);
        assert_eq!(short_name_from_reference(&once), once);
    }

    #[test]
    fn test_short_name_permissive_on_empty_terminal_segment() {
        assert_eq!(short_name_from_reference(""), "");
        assert_eq!(short_name_from_reference("projects/p/zones/"), "");
        assert_eq!(short_name_from_reference("/"), "");
    }

    #[test]
    fn test_region_from_zone() {
        assert_eq!(region_from_zone("us-central1-a"), "us-central1");
        assert_eq!(region_from_zone(ZONE_LINK), "asia-east1");
        assert_eq!(region_from_zone("nohyphen"), "nohyphen");
    }

    #[test]
    fn test_parse_full_self_link() {
        let link = SelfLink::parse(ZONE_LINK).unwrap();
        assert_eq!(link.project.as_deref(), Some("evandbrown17"));
        assert_eq!(link.collection.as_deref(), Some("zones"));
        assert_eq!(link.name, "asia-east1-a");
    }

    #[test]
    fn test_parse_bare_name() {
        let link = SelfLink::parse("us-west1").unwrap();
        assert_eq!(link.project, None);
        assert_eq!(link.collection, None);
        assert_eq!(link.name, "us-west1");
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert_eq!(SelfLink::parse(""), Err(ComputeError::Parse(String::new())));
        assert!(matches!(
            SelfLink::parse("projects/p/zones/"),
            Err(ComputeError::Parse(_))
        ));
    }
}
