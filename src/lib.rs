//! Compute Engine client pieces for provisioning build agents.
//!
//! - [`compute`] - region catalog and self-link parsing
//! - [`gcp`] - authentication, HTTP and the Compute API client
//! - [`credentials`] - credential lookup for agent access
//! - [`windows`] - Windows agent access configuration
//! - [`config`] - persisted user configuration

pub mod compute;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gcp;
pub mod windows;

pub use error::ComputeError;
