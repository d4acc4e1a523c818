//! Authenticated catalog session from configuration and flags.

use std::time::Duration;

use anyhow::{Context as _, Result};
use playsync_core::catalog::http::HttpCatalogSession;
use playsync_core::token::{TokenCache, TokenDispenser};
use playsync_core::{AuthMode, HttpCatalogClient, TokenSource, TokenStore, USER_AGENT, connect};
use playsync_schema::SessionCredential;
use reqwest::Client;
use tracing::info;

use crate::config::{ConfigError, Settings};
use crate::secret::account_credentials;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Session-related command-line switches.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub device_codename: String,
    /// `--token` was given.
    pub token: bool,
    pub token_url: Option<String>,
    /// Validated `--token-str` / `--gsf-id` pair.
    pub passed_token: Option<SessionCredential>,
}

pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Token dispenser URL, command line first.
fn token_url(options: &SessionOptions, settings: &Settings) -> Result<String, ConfigError> {
    options
        .token_url
        .clone()
        .or_else(|| settings.token_url.clone())
        .ok_or(ConfigError::Missing {
            section: "Credentials",
            key: "token_url",
        })
}

/// Log in, refreshing the token once if the catalog rejects it.
pub async fn open(options: &SessionOptions, settings: &Settings) -> Result<HttpCatalogSession> {
    let client = http_client()?;
    let login = HttpCatalogClient::new(
        client.clone(),
        settings.catalog_url()?,
        options.device_codename.clone(),
    )?;

    let use_token = options.token || settings.token || options.passed_token.is_some();
    let session = if use_token {
        let store = TokenStore::new(
            TokenCache::new(&settings.token_cache),
            TokenDispenser::new(client, token_url(options, settings)?),
        );
        let credential = match &options.passed_token {
            Some(passed) => {
                info!("Using passed token to connect to API");
                passed.clone()
            }
            None => {
                info!("Using auto retrieved token to connect to API");
                store.retrieve(false).await?
            }
        };
        connect(
            &login,
            AuthMode::Token {
                credential,
                source: &store,
            },
        )
        .await?
    } else {
        let (email, password) = account_credentials(settings)?;
        connect(&login, AuthMode::Password { email, password }).await?
    };
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(token_url: Option<&str>) -> Settings {
        Settings {
            source: PathBuf::from("playsync.conf"),
            email: None,
            password: None,
            keyring_service: None,
            token: true,
            token_url: token_url.map(str::to_string),
            catalog_url: Some("http://127.0.0.1:9/".into()),
            token_cache: PathBuf::from("token"),
        }
    }

    fn options(token_url: Option<&str>) -> SessionOptions {
        SessionOptions {
            device_codename: "bacon".into(),
            token: false,
            token_url: token_url.map(str::to_string),
            passed_token: None,
        }
    }

    #[test]
    fn test_flag_overrides_config_url() {
        let url = token_url(&options(Some("http://flag")), &settings(Some("http://file"))).unwrap();
        assert_eq!(url, "http://flag");
        let url = token_url(&options(None), &settings(Some("http://file"))).unwrap();
        assert_eq!(url, "http://file");
    }

    #[test]
    fn test_missing_token_url() {
        assert!(matches!(
            token_url(&options(None), &settings(None)),
            Err(ConfigError::Missing { key: "token_url", .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_catalog_url_fails_before_network() {
        let mut s = settings(Some("http://127.0.0.1:9/token"));
        s.catalog_url = None;
        let err = open(&options(None), &s).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Missing { key: "catalog_url", .. })
        ));
    }
}
