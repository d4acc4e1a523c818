//! Shared types for playsync.
//!
//! Everything here is plain data: the engine in `playsync-core` and the
//! command surface in `playsync-cli` agree on these records, and nothing in
//! this crate performs IO.

pub mod bundle;
pub mod credential;
pub mod package;
pub mod search;
pub mod size;

// Re-exports
pub use bundle::{DownloadBundle, ExpansionFile};
pub use credential::{CredentialError, SessionCredential, SessionId};
pub use package::{
    DownloadOutcome, LocalPackage, PackageRef, RemoteDetail, UpdateCandidate, is_plain_file_name,
};
pub use search::{Offer, SearchResult};
pub use size::format_size;

/// File extension of application archives managed by playsync.
pub const APK_EXTENSION: &str = "apk";
