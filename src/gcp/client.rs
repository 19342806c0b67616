//! Compute Engine client
//!
//! Combines a [`TokenSource`] with the HTTP wrapper and knows how Compute
//! Engine URLs are laid out.

use super::auth::{GcpCredentials, TokenSource};
use super::http::GcpHttpClient;
use crate::error::ComputeError;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Public Compute Engine endpoint
pub const DEFAULT_ENDPOINT: &str = "https://compute.googleapis.com";

/// Upper bound on followed `nextPageToken`s for one listing
const MAX_PAGES: usize = 100;

/// Client for the Compute Engine REST API, bound to one project
#[derive(Clone)]
pub struct ComputeClient {
    tokens: Arc<dyn TokenSource>,
    http: GcpHttpClient,
    project_id: String,
    endpoint: String,
}

impl std::fmt::Debug for ComputeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeClient")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ComputeClient {
    /// Create a client authenticated with Application Default Credentials
    pub async fn new(project_id: &str) -> Result<Self, ComputeError> {
        let credentials = GcpCredentials::new().await?;
        Self::with_token_source(project_id, Arc::new(credentials), DEFAULT_ENDPOINT)
    }

    /// Create a client with an explicit token source and endpoint
    ///
    /// The endpoint must be an absolute http(s) URL; emulators and tests
    /// point it at a local server.
    pub fn with_token_source(
        project_id: &str,
        tokens: Arc<dyn TokenSource>,
        endpoint: &str,
    ) -> Result<Self, ComputeError> {
        let parsed = Url::parse(endpoint).map_err(|e| {
            ComputeError::Configuration(format!("invalid endpoint '{}': {}", endpoint, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ComputeError::Configuration(format!(
                "endpoint '{}' must use http or https",
                endpoint
            )));
        }

        Ok(Self {
            tokens,
            http: GcpHttpClient::new()?,
            project_id: project_id.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Project this client was configured with
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Endpoint requests are sent to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Make a GET request to the Compute API
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ComputeError> {
        let token = self.tokens.token().await?;
        self.http.get(url, &token, query).await
    }

    /// GET a list endpoint and collect `items` across all pages
    pub async fn list_items(&self, url: &str) -> Result<Vec<Value>, ComputeError> {
        let mut all_items = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let response = match page_token.as_deref() {
                Some(token) => self.get(url, &[("pageToken", token)]).await?,
                None => self.get(url, &[]).await?,
            };

            let Value::Object(mut page) = response else {
                return Err(ComputeError::transport(format!(
                    "malformed list response from {}: expected a JSON object",
                    url
                )));
            };

            match page.remove("items") {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => all_items.extend(items),
                Some(_) => {
                    return Err(ComputeError::transport(format!(
                        "malformed list response from {}: `items` is not an array",
                        url
                    )))
                }
            }

            page_token = match page.remove("nextPageToken") {
                None | Some(Value::Null) => None,
                Some(Value::String(token)) => Some(token).filter(|s| !s.is_empty()),
                Some(_) => {
                    return Err(ComputeError::transport(format!(
                        "malformed list response from {}: `nextPageToken` is not a string",
                        url
                    )))
                }
            };

            if page_token.is_none() {
                return Ok(all_items);
            }
        }

        Err(ComputeError::transport(format!(
            "listing {} did not finish after {} pages",
            url, MAX_PAGES
        )))
    }

    // =========================================================================
    // Compute Engine API helpers
    // =========================================================================

    /// Build Compute Engine API URL for a project
    pub fn compute_url(&self, project_id: &str, path: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/{}",
            self.endpoint,
            urlencoding::encode(project_id),
            path
        )
    }

    /// Build the region listing URL for a project
    pub fn regions_url(&self, project_id: &str) -> String {
        self.compute_url(project_id, "regions")
    }

    /// Build the zone listing URL for a project
    pub fn zones_url(&self, project_id: &str) -> String {
        self.compute_url(project_id, "zones")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::auth::StaticToken;

    fn client(endpoint: &str) -> Result<ComputeClient, ComputeError> {
        ComputeClient::with_token_source("test-project", Arc::new(StaticToken::new("t")), endpoint)
    }

    #[test]
    fn test_regions_url() {
        let client = client("https://compute.googleapis.com/").unwrap();
        assert_eq!(
            client.regions_url("evandbrown17"),
            "https://compute.googleapis.com/compute/v1/projects/evandbrown17/regions"
        );
        assert_eq!(
            client.zones_url("p"),
            "https://compute.googleapis.com/compute/v1/projects/p/zones"
        );
    }

    #[test]
    fn test_project_is_path_encoded() {
        let client = client(DEFAULT_ENDPOINT).unwrap();
        assert!(client.regions_url("a/b").contains("/projects/a%2Fb/regions"));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        assert!(matches!(client("not a url"), Err(ComputeError::Configuration(_))));
        assert!(matches!(
            client("ftp://compute.example.com"),
            Err(ComputeError::Configuration(_))
        ));
    }
}
