//! Bearer token acquisition.
//!
//! [`TokenStore`] combines the on-disk [`TokenCache`] with the remote
//! [`TokenDispenser`]: it serves the cached pair when there is one and only
//! goes to the network when the cache is empty or a refresh is forced.

pub mod cache;
pub mod dispenser;

use std::path::PathBuf;

use async_trait::async_trait;
use playsync_schema::SessionCredential;
use thiserror::Error;
use tracing::info;

pub use cache::TokenCache;
pub use dispenser::TokenDispenser;

/// Errors raised while obtaining or caching a token.
#[derive(Error, Debug)]
pub enum TokenError {
    /// The dispenser refused to issue a token (usually rate limiting).
    #[error("Token dispenser auth error, probably too many connections")]
    DispenserAuth,

    /// The dispenser failed internally.
    #[error("Token dispenser server error")]
    DispenserServer,

    #[error("Unexpected token dispenser response: {0:?}")]
    MalformedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to write token to cache file {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can hand out a session credential.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a credential, bypassing any cache when `force_new` is set.
    async fn retrieve(&self, force_new: bool) -> Result<SessionCredential, TokenError>;
}

/// Cache-first token source backed by a dispenser endpoint.
#[derive(Debug, Clone)]
pub struct TokenStore {
    cache: TokenCache,
    dispenser: TokenDispenser,
}

impl TokenStore {
    pub fn new(cache: TokenCache, dispenser: TokenDispenser) -> Self {
        Self { cache, dispenser }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }
}

#[async_trait]
impl TokenSource for TokenStore {
    async fn retrieve(&self, force_new: bool) -> Result<SessionCredential, TokenError> {
        if !force_new {
            if let Some(cred) = self.cache.read_cached() {
                info!("Using cached token.");
                return Ok(cred);
            }
        }

        info!("Retrieving token ...");
        let cred = self.dispenser.fetch_fresh().await?;
        info!(session_id = %cred.session_id, "Token retrieved");
        self.cache.write_cached(&cred)?;
        Ok(cred)
    }
}
