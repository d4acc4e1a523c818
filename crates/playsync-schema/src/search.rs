//! Catalog search records.

use serde::{Deserialize, Serialize};

/// Purchase offer attached to a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// True when the entry must be bought before download.
    pub checkout_flow_required: bool,
}

/// A single catalog search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Display title.
    pub title: String,
    /// Publisher name.
    pub creator: String,
    /// Installed size in bytes.
    pub installation_size: u64,
    /// Download count bucket as reported (`1,000+`).
    pub num_downloads: String,
    /// Last update date as reported.
    pub upload_date: String,
    /// Catalog identifier.
    pub doc_id: String,
    /// Current version.
    pub version_code: i64,
    /// Average rating, `0.0` to `5.0`.
    pub star_rating: f64,
    /// Empty for pre-registration entries.
    #[serde(default)]
    pub offers: Vec<Offer>,
}

impl SearchResult {
    /// Entries without any offer are pre-registration betas.
    pub fn is_preregistration(&self) -> bool {
        self.offers.is_empty()
    }

    /// Whether the first offer requires a purchase.
    pub fn is_paid(&self) -> bool {
        self.offers.first().is_some_and(|o| o.checkout_flow_required)
    }
}
