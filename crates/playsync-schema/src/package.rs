//! Package records exchanged between the scanner, reconciler and downloader.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::APK_EXTENSION;

/// A request to fetch one catalog entry, optionally under a chosen filename.
///
/// Identity is the catalog identifier alone: two refs naming the same
/// identifier are the same entry even if their filenames differ.
///
/// # Example
///
/// ```
/// use playsync_schema::PackageRef;
///
/// let bare = PackageRef::from("org.example.app");
/// assert_eq!(bare.target_filename(), "org.example.app.apk");
///
/// let named = PackageRef::with_filename("org.example.app", "Example.apk");
/// assert_eq!(named.target_filename(), "Example.apk");
/// assert_eq!(bare, named);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRef {
    /// Unique catalog key (e.g. `org.example.app`).
    pub identifier: String,
    /// Filename to write the primary archive under, if the caller chose one.
    pub display_filename: Option<String>,
}

impl PackageRef {
    /// A bare reference with no target filename.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_filename: None,
        }
    }

    /// A reference that should be written under `filename`.
    pub fn with_filename(identifier: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_filename: Some(filename.into()),
        }
    }

    /// Filename of the primary archive: the chosen one, or `<identifier>.apk`.
    pub fn target_filename(&self) -> String {
        match &self.display_filename {
            Some(name) => name.clone(),
            None => format!("{}.{APK_EXTENSION}", self.identifier),
        }
    }
}

impl PartialEq for PackageRef {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for PackageRef {}

impl Hash for PackageRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl From<&str> for PackageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageRef {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.display_filename {
            Some(name) => write!(f, "{name} : {}", self.identifier),
            None => write!(f, "{}", self.identifier),
        }
    }
}

/// Whether `name` is a single, ordinary path component.
///
/// Names built from catalog data pass through this before being joined onto a
/// destination directory, so that nothing is written outside it.
///
/// # Example
///
/// ```
/// use playsync_schema::is_plain_file_name;
///
/// assert!(is_plain_file_name("main.42.com.game.obb"));
/// assert!(!is_plain_file_name("../evil.obb"));
/// assert!(!is_plain_file_name("/tmp/evil.obb"));
/// assert!(!is_plain_file_name(".."));
/// ```
pub fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\', '\0'])
        && name != "."
        && name != ".."
        && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// An archive found on disk. Recomputed on every pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    /// Package name read from the archive's manifest.
    pub identifier: String,
    /// `versionCode` read from the manifest.
    pub local_version: i64,
    /// Name of the archive inside the scanned folder.
    pub filename: String,
    /// Full path of the archive.
    pub filepath: std::path::PathBuf,
}

/// Current catalog version of one identifier.
///
/// A `remote_version` of `0` means the catalog does not know the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDetail {
    /// Catalog identifier this detail answers for.
    pub identifier: String,
    /// Latest catalog version, `0` when not listed.
    pub remote_version: i64,
}

impl RemoteDetail {
    /// Placeholder for an identifier the catalog returned nothing for.
    pub fn missing(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            remote_version: 0,
        }
    }

    /// Whether the catalog knows this identifier.
    pub fn is_listed(&self) -> bool {
        self.remote_version != 0
    }
}

/// A local package whose catalog version is strictly newer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCandidate {
    /// Catalog identifier.
    pub identifier: String,
    /// Existing archive to overwrite.
    pub filename: String,
    /// Version currently on disk.
    pub local_version: i64,
    /// Newer version offered by the catalog.
    pub remote_version: i64,
}

impl UpdateCandidate {
    /// Compare a local package against its catalog detail.
    ///
    /// Returns a candidate only when the local version is a positive integer,
    /// the catalog lists the package (`remote_version != 0`) and the local
    /// version is strictly older.
    ///
    /// # Example
    ///
    /// ```
    /// use playsync_schema::{LocalPackage, RemoteDetail, UpdateCandidate};
    ///
    /// let local = LocalPackage {
    ///     identifier: "com.a".into(),
    ///     local_version: 1,
    ///     filename: "a.apk".into(),
    ///     filepath: "a.apk".into(),
    /// };
    /// assert!(UpdateCandidate::evaluate(&local, &RemoteDetail { identifier: "com.a".into(), remote_version: 2 }).is_some());
    /// assert!(UpdateCandidate::evaluate(&local, &RemoteDetail::missing("com.a")).is_none());
    /// ```
    pub fn evaluate(local: &LocalPackage, remote: &RemoteDetail) -> Option<Self> {
        if local.local_version <= 0 || !remote.is_listed() {
            return None;
        }
        if local.local_version >= remote.remote_version {
            return None;
        }
        Some(Self {
            identifier: local.identifier.clone(),
            filename: local.filename.clone(),
            local_version: local.local_version,
            remote_version: remote.remote_version,
        })
    }

    /// The download request that fetches this update over the existing file.
    pub fn to_request(&self) -> PackageRef {
        PackageRef::with_filename(self.identifier.clone(), self.filename.clone())
    }
}

/// How a single download request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Archive (and expansion files, if any) fetched and written.
    Success(String),
    /// The catalog has no such package.
    Unavailable(PackageRef, String),
    /// Remote or local failure.
    Failed(PackageRef, String),
}

impl DownloadOutcome {
    /// Identifier the outcome refers to.
    pub fn identifier(&self) -> &str {
        match self {
            Self::Success(id) => id,
            Self::Unavailable(pkg, _) | Self::Failed(pkg, _) => &pkg.identifier,
        }
    }

    /// Whether the package ended up on disk.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
