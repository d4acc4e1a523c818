//! Configuration file handling for `playsync.conf`.
//!
//! The file is INI with a `[Credentials]` and a `[Cache]` section. The first
//! file found in the standard locations wins; `--config` bypasses the search.

use ini::Ini;
use playsync_core::paths::{config_search_paths, default_token_cache, expand_tilde};
use playsync_schema::SessionCredential;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No configuration file found at {}", format_paths(.0))]
    NotFound(Vec<PathBuf>),

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {section}.{key}")]
    Missing {
        section: &'static str,
        key: &'static str,
    },

    #[error("Token string and GSF id have to be passed at the same time")]
    TokenPairMismatch,
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values read from the configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// File the settings were read from.
    pub source: PathBuf,
    pub email: Option<String>,
    pub password: Option<String>,
    pub keyring_service: Option<String>,
    /// Use token authentication by default.
    pub token: bool,
    pub token_url: Option<String>,
    pub catalog_url: Option<String>,
    pub token_cache: PathBuf,
}

impl Settings {
    /// Load from `explicit` if given, else from the first existing standard
    /// location.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let candidates = match explicit {
            Some(path) => vec![path.to_path_buf()],
            None => config_search_paths(),
        };
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| ConfigError::NotFound(candidates.clone()))?;
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_ini(&ini, path)
    }

    pub fn catalog_url(&self) -> Result<&str, ConfigError> {
        self.catalog_url.as_deref().ok_or(ConfigError::Missing {
            section: "Credentials",
            key: "catalog_url",
        })
    }
}

/// Map an `Ini` to [`Settings`].
fn parse_ini(ini: &Ini, source: &Path) -> Result<Settings, ConfigError> {
    let mut settings = Settings {
        source: source.to_path_buf(),
        email: None,
        password: None,
        keyring_service: None,
        token: false,
        token_url: None,
        catalog_url: None,
        token_cache: default_token_cache(),
    };

    if let Some(section) = ini.section(Some("Credentials")) {
        settings.email = non_empty(section.get("email"));
        settings.password = non_empty(section.get("password"));
        settings.keyring_service = non_empty(section.get("keyring_service"));
        settings.token_url = non_empty(section.get("token_url"));
        settings.catalog_url = non_empty(section.get("catalog_url"));
        if let Some(v) = section.get("token") {
            settings.token = parse_bool(v).ok_or_else(|| ConfigError::InvalidValue {
                section: "Credentials".to_string(),
                key: "token".to_string(),
                value: v.to_string(),
                reason: "expected a boolean (true/false, yes/no, on/off, 1/0)".to_string(),
            })?;
        }
    }

    if let Some(section) = ini.section(Some("Cache")) {
        if let Some(v) = non_empty(section.get("token")) {
            settings.token_cache = expand_tilde(&v);
        }
    }

    Ok(settings)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Validate the `--token-str` / `--gsf-id` pair.
///
/// Both absent is `Ok(None)`; exactly one is an error.
pub fn token_override(
    token: Option<&str>,
    session_id: Option<&str>,
) -> Result<Option<SessionCredential>, ConfigError> {
    match (token, session_id) {
        (None, None) => Ok(None),
        (Some(token), Some(id)) => SessionCredential::parse(token, id)
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                section: "command line".to_string(),
                key: "gsf-id".to_string(),
                value: id.to_string(),
                reason: e.to_string(),
            }),
        _ => Err(ConfigError::TokenPairMismatch),
    }
}
