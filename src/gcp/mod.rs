//! GCP API interaction module
//!
//! Authentication, the HTTP wrapper and the Compute Engine client.
//!
//! # Module Structure
//!
//! - [`auth`] - token sources and gcloud default discovery
//! - [`client`] - Compute Engine client bound to a project
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use gce_agents::gcp::client::ComputeClient;
//!
//! async fn example() -> Result<(), gce_agents::ComputeError> {
//!     let client = ComputeClient::new("my-project").await?;
//!     let zones = client.list_items(&client.zones_url("my-project")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
