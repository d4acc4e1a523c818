//! playsync core library.
//!
//! Keeps a local folder of application archives in step with a remote
//! catalog: inventory, reconciliation, batch downloads and the token-based
//! session bootstrap that precedes them.

pub mod apk;
pub mod audit;
pub mod catalog;
pub mod orchestrate;
pub mod paths;
pub mod reconcile;
pub mod reporter;
pub mod scan;
pub mod session;
pub mod token;

// Re-exports
pub use audit::{AuditLog, AuditLogError};
pub use catalog::{
    Catalog, CatalogError, CatalogLogin, Credentials, DownloadOptions, HttpCatalogClient,
};
pub use orchestrate::{BatchReport, OrchestrateError, Orchestrator, OrchestratorOptions};
pub use reconcile::{ReconcileError, reconcile};
pub use reporter::{NullReporter, Reporter};
pub use scan::{ScanError, ScanReport, Scanner};
pub use session::{AuthMode, SessionError, connect};
pub use token::{TokenError, TokenSource, TokenStore};

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("playsync/", env!("CARGO_PKG_VERSION"));
