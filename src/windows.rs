//! Windows agent access configuration
//!
//! Windows agents are reached over SSH with either a password or a private
//! key. The configuration only stores credential ids; secrets are resolved
//! through a [`CredentialProvider`] when a connection is made.

use crate::credentials::{Credential, CredentialProvider};
use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Message reported when neither credential id is set
pub const MISSING_CREDENTIAL: &str = "A password or private key credential is required";

/// Outcome of validating agent access settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Ok,
    Error(String),
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

fn normalize(id: Option<&str>) -> Option<String> {
    id.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Check that at least one of the two credential ids is set
pub fn validate_credential_ids(password_id: Option<&str>, private_key_id: Option<&str>) -> Validation {
    if normalize(password_id).is_none() && normalize(private_key_id).is_none() {
        return Validation::Error(MISSING_CREDENTIAL.to_string());
    }
    Validation::Ok
}

/// Credential ids used to reach Windows agents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindowsConfiguration")]
pub struct WindowsConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    password_credentials_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    private_key_credentials_id: Option<String>,
}

/// Unvalidated form read from config files
#[derive(Deserialize)]
struct RawWindowsConfiguration {
    #[serde(default)]
    password_credentials_id: Option<String>,
    #[serde(default)]
    private_key_credentials_id: Option<String>,
}

impl TryFrom<RawWindowsConfiguration> for WindowsConfiguration {
    type Error = ComputeError;

    fn try_from(raw: RawWindowsConfiguration) -> Result<Self, Self::Error> {
        Self::new(
            raw.password_credentials_id.as_deref(),
            raw.private_key_credentials_id.as_deref(),
        )
    }
}

impl WindowsConfiguration {
    /// Build a validated configuration. Empty ids count as unset.
    pub fn new(
        password_credentials_id: Option<&str>,
        private_key_credentials_id: Option<&str>,
    ) -> Result<Self, ComputeError> {
        if let Validation::Error(message) =
            validate_credential_ids(password_credentials_id, private_key_credentials_id)
        {
            return Err(ComputeError::Validation(message));
        }

        Ok(Self {
            password_credentials_id: normalize(password_credentials_id),
            private_key_credentials_id: normalize(private_key_credentials_id),
        })
    }

    pub fn password_credentials_id(&self) -> Option<&str> {
        self.password_credentials_id.as_deref()
    }

    pub fn private_key_credentials_id(&self) -> Option<&str> {
        self.private_key_credentials_id.as_deref()
    }

    /// Plain-text password for SSH, if a password credential is configured
    /// and resolves to a username/password credential
    pub fn password(&self, provider: &dyn CredentialProvider) -> Option<String> {
        let id = self.password_credentials_id.as_deref()?;
        match provider.resolve(id) {
            Some(Credential::UsernamePassword { password, .. }) => Some(password),
            Some(other) => {
                tracing::warn!("Credential {} is a {}, expected a password", id, other.kind());
                None
            }
            None => {
                tracing::warn!("Password credential {} not found", id);
                None
            }
        }
    }

    /// SSH private key credential, if one is configured and resolves
    pub fn private_key_credentials(&self, provider: &dyn CredentialProvider) -> Option<Credential> {
        let id = self.private_key_credentials_id.as_deref()?;
        match provider.resolve(id) {
            Some(credential @ Credential::SshPrivateKey { .. }) => Some(credential),
            Some(other) => {
                tracing::warn!("Credential {} is a {}, expected an SSH key", id, other.kind());
                None
            }
            None => {
                tracing::warn!("Private key credential {} not found", id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::InMemoryCredentialStore;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new()
            .with(Credential::UsernamePassword {
                id: "pw".to_string(),
                username: "Administrator".to_string(),
                password: "s3cret".to_string(),
            })
            .with(Credential::SshPrivateKey {
                id: "key".to_string(),
                username: "jenkins".to_string(),
                private_key: "-----BEGIN-----".to_string(),
                passphrase: None,
            })
    }

    #[test]
    fn test_validation_requires_one_id() {
        assert_eq!(
            validate_credential_ids(None, None),
            Validation::Error(MISSING_CREDENTIAL.to_string())
        );
        assert!(!validate_credential_ids(Some(""), Some("  ")).is_ok());
        assert!(validate_credential_ids(Some("pw"), None).is_ok());
        assert!(validate_credential_ids(None, Some("key")).is_ok());
    }

    #[test]
    fn test_new_rejects_missing_ids() {
        let err = WindowsConfiguration::new(Some(""), None).unwrap_err();
        assert_eq!(err, ComputeError::Validation(MISSING_CREDENTIAL.to_string()));
    }

    #[test]
    fn test_new_normalizes_empty_ids() {
        let config = WindowsConfiguration::new(Some("pw"), Some("")).unwrap();
        assert_eq!(config.password_credentials_id(), Some("pw"));
        assert_eq!(config.private_key_credentials_id(), None);
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        let err = serde_json::from_str::<WindowsConfiguration>("{}").unwrap_err();
        assert!(err.to_string().contains(MISSING_CREDENTIAL));

        assert!(serde_json::from_str::<WindowsConfiguration>(
            r#"{"password_credentials_id": "", "private_key_credentials_id": " "}"#
        )
        .is_err());

        let config: WindowsConfiguration =
            serde_json::from_str(r#"{"private_key_credentials_id": "key", "password_credentials_id": ""}"#)
                .unwrap();
        assert_eq!(config.private_key_credentials_id(), Some("key"));
        assert_eq!(config.password_credentials_id(), None);
    }

    #[test]
    fn test_password_lookup() {
        let store = store();
        let config = WindowsConfiguration::new(Some("pw"), None).unwrap();
        assert_eq!(config.password(&store).as_deref(), Some("s3cret"));
        assert!(config.private_key_credentials(&store).is_none());
    }

    #[test]
    fn test_private_key_lookup() {
        let store = store();
        let config = WindowsConfiguration::new(None, Some("key")).unwrap();
        let credential = config.private_key_credentials(&store).unwrap();
        assert_eq!(credential.username(), "jenkins");
        assert!(config.password(&store).is_none());
    }

    #[test]
    fn test_wrong_kind_or_missing_resolves_to_none() {
        let store = store();
        let config = WindowsConfiguration::new(Some("key"), Some("pw")).unwrap();
        assert!(config.password(&store).is_none());
        assert!(config.private_key_credentials(&store).is_none());

        let config = WindowsConfiguration::new(Some("gone"), None).unwrap();
        assert!(config.password(&store).is_none());
    }
}
