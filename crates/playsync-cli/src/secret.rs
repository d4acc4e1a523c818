//! Account password lookup.
//!
//! The provider is picked once from the configuration: a plaintext password
//! wins, otherwise a keyring service name selects the platform secret store.

use thiserror::Error;
use tracing::info;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("You asked for keyring service but playsync was built without keyring support")]
    KeyringUnavailable,

    #[error("Keyring lookup failed for {service}/{account}: {message}")]
    Keyring {
        service: String,
        account: String,
        message: String,
    },

    #[error("No password configured: set Credentials.password or Credentials.keyring_service")]
    NoPassword,

    #[error("No account configured: set Credentials.email")]
    NoAccount,
}

/// Something that can produce the password for an account.
pub trait SecretProvider: Send + Sync {
    fn password(&self, account: &str) -> Result<String, SecretError>;
}

/// Password stored in the configuration file.
pub struct PlaintextSecretProvider {
    password: String,
}

impl std::fmt::Debug for PlaintextSecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PlaintextSecretProvider(..)")
    }
}

impl PlaintextSecretProvider {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl SecretProvider for PlaintextSecretProvider {
    fn password(&self, _account: &str) -> Result<String, SecretError> {
        Ok(self.password.clone())
    }
}

/// Password held by the platform secret store under `service`.
#[derive(Debug, Clone)]
pub struct KeyringSecretProvider {
    service: String,
}

impl KeyringSecretProvider {
    /// Fails with [`SecretError::KeyringUnavailable`] when the binary was
    /// built without the `keyring` feature.
    pub fn new(service: impl Into<String>) -> Result<Self, SecretError> {
        if cfg!(feature = "keyring") {
            Ok(Self {
                service: service.into(),
            })
        } else {
            Err(SecretError::KeyringUnavailable)
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }
}

impl SecretProvider for KeyringSecretProvider {
    #[cfg(feature = "keyring")]
    fn password(&self, account: &str) -> Result<String, SecretError> {
        let wrap = |e: keyring::Error| SecretError::Keyring {
            service: self.service.clone(),
            account: account.to_string(),
            message: e.to_string(),
        };
        keyring::Entry::new(&self.service, account)
            .map_err(wrap)?
            .get_password()
            .map_err(wrap)
    }

    #[cfg(not(feature = "keyring"))]
    fn password(&self, _account: &str) -> Result<String, SecretError> {
        Err(SecretError::KeyringUnavailable)
    }
}

/// Choose the provider for `settings`.
pub fn select_provider(settings: &Settings) -> Result<Box<dyn SecretProvider>, SecretError> {
    if let Some(password) = &settings.password {
        info!("Using plaintext password");
        return Ok(Box::new(PlaintextSecretProvider::new(password.clone())));
    }
    if let Some(service) = &settings.keyring_service {
        info!(service = %service, "Using keyring password");
        return Ok(Box::new(KeyringSecretProvider::new(service.clone())?));
    }
    Err(SecretError::NoPassword)
}

/// Resolve `(email, password)` for password authentication.
pub fn account_credentials(settings: &Settings) -> Result<(String, String), SecretError> {
    let email = settings.email.clone().ok_or(SecretError::NoAccount)?;
    let password = select_provider(settings)?.password(&email)?;
    Ok((email, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(password: Option<&str>, keyring: Option<&str>) -> Settings {
        Settings {
            source: PathBuf::from("playsync.conf"),
            email: Some("me@example.com".into()),
            password: password.map(str::to_string),
            keyring_service: keyring.map(str::to_string),
            token: false,
            token_url: None,
            catalog_url: None,
            token_cache: PathBuf::from("token"),
        }
    }

    #[test]
    fn test_plaintext_wins() {
        let (email, password) =
            account_credentials(&settings(Some("hunter2"), Some("svc"))).unwrap();
        assert_eq!(email, "me@example.com");
        assert_eq!(password, "hunter2");
    }

    #[test]
    fn test_nothing_configured() {
        assert!(matches!(
            select_provider(&settings(None, None)),
            Err(SecretError::NoPassword)
        ));
    }

    #[test]
    fn test_missing_email() {
        let mut s = settings(Some("pw"), None);
        s.email = None;
        assert!(matches!(
            account_credentials(&s),
            Err(SecretError::NoAccount)
        ));
    }

    #[cfg(not(feature = "keyring"))]
    #[test]
    fn test_keyring_unavailable_without_feature() {
        assert!(matches!(
            select_provider(&settings(None, Some("svc"))),
            Err(SecretError::KeyringUnavailable)
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let provider = PlaintextSecretProvider::new("hunter2");
        assert!(!format!("{provider:?}").contains("hunter2"));
    }
}
