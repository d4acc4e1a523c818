//! Remote catalog capability.
//!
//! The engine talks to the catalog only through these traits. A login step
//! turns an unauthenticated [`CatalogLogin`] handle (already bound to a device
//! profile) into an authenticated [`Catalog`] session.

pub mod http;

use async_trait::async_trait;
use playsync_schema::{DownloadBundle, RemoteDetail, SearchResult, SessionCredential};
use thiserror::Error;

pub use http::HttpCatalogClient;

/// Errors reported by a catalog implementation.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Malformed catalog response: {0}")]
    MalformedResponse(String),

    #[error("Failed to decode catalog response: {0}")]
    Decode(String),

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    /// The catalog returned an empty result where an entry was expected.
    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Package not found: {0}")]
    NotFound(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    /// Failures that mean the bearer token is stale and worth refreshing.
    pub fn is_token_expiry(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_)
                | Self::Decode(_)
                | Self::LoginRejected(_)
                | Self::IndexOutOfRange(_)
        )
    }

    /// Failures that mean the requested package does not exist in the catalog.
    pub fn is_not_in_catalog(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::IndexOutOfRange(_))
    }
}

/// How to authenticate against the catalog.
#[derive(Debug, Clone)]
pub enum Credentials {
    Password { email: String, password: String },
    Token(SessionCredential),
}

/// Per-download switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    /// Also fetch expansion files.
    pub expansion_files: bool,
}

/// Unauthenticated handle.
#[async_trait]
pub trait CatalogLogin: Send + Sync {
    type Session: Catalog;

    /// Authenticate, producing a session for all further calls.
    async fn login(&self, credentials: &Credentials) -> Result<Self::Session, CatalogError>;
}

/// Authenticated catalog session.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Current details for many identifiers in one round trip.
    ///
    /// The result has exactly one entry per requested identifier, in request
    /// order; unknown identifiers come back with `remote_version == 0`.
    async fn bulk_details(&self, identifiers: &[String]) -> Result<Vec<RemoteDetail>, CatalogError>;

    /// Fetch the primary archive and, if requested, its expansion files.
    async fn download(
        &self,
        identifier: &str,
        options: DownloadOptions,
    ) -> Result<DownloadBundle, CatalogError>;

    /// Free-text search.
    async fn search(&self, query: &str, max_results: usize)
    -> Result<Vec<SearchResult>, CatalogError>;
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for std::sync::Arc<T> {
    async fn bulk_details(&self, identifiers: &[String]) -> Result<Vec<RemoteDetail>, CatalogError> {
        (**self).bulk_details(identifiers).await
    }

    async fn download(
        &self,
        identifier: &str,
        options: DownloadOptions,
    ) -> Result<DownloadBundle, CatalogError> {
        (**self).download(identifier, options).await
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        (**self).search(query, max_results).await
    }
}

#[async_trait]
impl<T: Catalog + ?Sized> Catalog for &T {
    async fn bulk_details(&self, identifiers: &[String]) -> Result<Vec<RemoteDetail>, CatalogError> {
        (**self).bulk_details(identifiers).await
    }

    async fn download(
        &self,
        identifier: &str,
        options: DownloadOptions,
    ) -> Result<DownloadBundle, CatalogError> {
        (**self).download(identifier, options).await
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        (**self).search(query, max_results).await
    }
}

/// Check the order/length parity every [`Catalog::bulk_details`] must honour.
///
/// # Errors
///
/// Returns [`CatalogError::MalformedResponse`] if the lengths differ or an
/// entry names a different identifier than the request at that position.
pub fn check_parity(requested: &[String], details: &[RemoteDetail]) -> Result<(), CatalogError> {
    if requested.len() != details.len() {
        return Err(CatalogError::MalformedResponse(format!(
            "bulk details returned {} entries for {} identifiers",
            details.len(),
            requested.len()
        )));
    }
    for (req, detail) in requested.iter().zip(details) {
        if detail.is_listed() && &detail.identifier != req {
            return Err(CatalogError::MalformedResponse(format!(
                "bulk details out of order: expected {req}, got {}",
                detail.identifier
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_classes() {
        assert!(CatalogError::Decode("x".into()).is_token_expiry());
        assert!(CatalogError::LoginRejected("x".into()).is_token_expiry());
        assert!(CatalogError::IndexOutOfRange("x".into()).is_token_expiry());
        assert!(CatalogError::MalformedResponse("x".into()).is_token_expiry());
        assert!(!CatalogError::NotFound("x".into()).is_token_expiry());
        assert!(!CatalogError::Other("x".into()).is_token_expiry());
    }

    #[test]
    fn test_parity_check() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let ok = vec![
            RemoteDetail {
                identifier: "a".into(),
                remote_version: 3,
            },
            RemoteDetail::missing("b"),
        ];
        assert!(check_parity(&ids, &ok).is_ok());
        assert!(check_parity(&ids, &ok[..1]).is_err());

        let swapped = vec![
            RemoteDetail {
                identifier: "b".into(),
                remote_version: 1,
            },
            RemoteDetail::missing("a"),
        ];
        assert!(check_parity(&ids, &swapped).is_err());
    }
}
