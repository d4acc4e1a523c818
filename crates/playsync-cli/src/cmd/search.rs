//! Search command

use anyhow::{Context, Result};
use playsync_core::{Catalog, CatalogError};
use playsync_schema::SearchResult;

use crate::ui::search::{filter_results, render};

/// Query the catalog and keep what is downloadable.
///
/// An empty catalog answer counts as no result rather than a failure.
pub async fn fetch<C: Catalog + ?Sized>(
    catalog: &C,
    query: &str,
    number: usize,
    include_paid: bool,
) -> Result<Vec<SearchResult>> {
    let results = match catalog.search(query, number).await {
        Ok(results) => results,
        Err(CatalogError::IndexOutOfRange(_)) => Vec::new(),
        Err(e) => return Err(e).context("Search failed"),
    };
    Ok(filter_results(&results, number, include_paid)
        .into_iter()
        .cloned()
        .collect())
}

pub async fn search<C: Catalog + ?Sized>(
    catalog: &C,
    query: &str,
    number: usize,
    include_paid: bool,
) -> Result<()> {
    let rows = fetch(catalog, query, number, include_paid).await?;
    if rows.is_empty() {
        println!("No result");
        return Ok(());
    }
    let refs: Vec<&SearchResult> = rows.iter().collect();
    println!("{}", render(&refs));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::testing::StubCatalog;
    use playsync_schema::Offer;

    fn result(id: &str, paid: bool) -> SearchResult {
        SearchResult {
            title: id.into(),
            creator: "c".into(),
            installation_size: 10,
            num_downloads: "10+".into(),
            upload_date: "today".into(),
            doc_id: id.into(),
            version_code: 1,
            star_rating: 3.0,
            offers: vec![Offer {
                checkout_flow_required: paid,
            }],
        }
    }

    #[tokio::test]
    async fn test_free_only_by_default() {
        let catalog = StubCatalog {
            results: vec![result("com.paid", true), result("com.free", false)],
            ..StubCatalog::default()
        };
        let rows = fetch(&catalog, "x", 10, false).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].doc_id, "com.free");

        let rows = fetch(&catalog, "x", 10, true).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_results() {
        let catalog = StubCatalog::default();
        assert!(fetch(&catalog, "nothing", 5, false).await.unwrap().is_empty());
    }
}
