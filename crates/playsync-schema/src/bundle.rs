//! Payload returned by a catalog download.

use bytes::Bytes;

/// A secondary data file shipped alongside a package archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionFile {
    /// Expansion kind as reported by the catalog (`main`, `patch`).
    pub kind: String,
    /// Version of the data file, independent of the archive's.
    pub version_code: i64,
    /// File contents.
    pub data: Bytes,
}

impl ExpansionFile {
    /// Deterministic on-disk name: `{kind}.{version_code}.{doc_id}.obb`.
    ///
    /// Independent of the primary archive's filename.
    ///
    /// # Example
    ///
    /// ```
    /// use playsync_schema::ExpansionFile;
    ///
    /// let obb = ExpansionFile { kind: "main".into(), version_code: 42, data: Default::default() };
    /// assert_eq!(obb.file_name("com.game"), "main.42.com.game.obb");
    /// ```
    pub fn file_name(&self, doc_id: &str) -> String {
        format!("{}.{}.{doc_id}.obb", self.kind, self.version_code)
    }
}

/// Everything fetched for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadBundle {
    /// Catalog identifier the payload belongs to.
    pub doc_id: String,
    /// The application archive itself.
    pub primary: Bytes,
    /// Empty unless expansion files were requested.
    pub expansion_files: Vec<ExpansionFile>,
}

impl DownloadBundle {
    /// Total payload size in bytes.
    pub fn size(&self) -> u64 {
        let extra: usize = self.expansion_files.iter().map(|f| f.data.len()).sum();
        (self.primary.len() + extra) as u64
    }
}
