//! Search result table.

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, ContentArrangement, Table};
use playsync_schema::{SearchResult, format_size};

pub const HEADERS: [&str; 8] = [
    "Title",
    "Creator",
    "Size",
    "Downloads",
    "Last Update",
    "AppID",
    "Version",
    "Rating",
];

/// Keep at most `max` downloadable results.
///
/// Pre-registration entries (no offer) are always dropped; paid ones unless
/// `include_paid`.
pub fn filter_results(results: &[SearchResult], max: usize, include_paid: bool) -> Vec<&SearchResult> {
    results
        .iter()
        .filter(|r| !r.is_preregistration())
        .filter(|r| include_paid || !r.is_paid())
        .take(max)
        .collect()
}

/// Plain cell values for one row, in [`HEADERS`] order.
pub fn row(result: &SearchResult) -> [String; 8] {
    [
        result.title.clone(),
        result.creator.clone(),
        format_size(result.installation_size),
        result.num_downloads.clone(),
        result.upload_date.clone(),
        result.doc_id.clone(),
        result.version_code.to_string(),
        format!("{:.2}", result.star_rating),
    ]
}

pub fn render(results: &[&SearchResult]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(HEADERS.iter().map(|h| Cell::new(*h)));
    for result in results {
        table.add_row(row(result));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use playsync_schema::Offer;

    fn result(id: &str, offers: Vec<Offer>) -> SearchResult {
        SearchResult {
            title: format!("Title {id}"),
            creator: "ACME".into(),
            installation_size: 1536,
            num_downloads: "1,000+".into(),
            upload_date: "Jan 1, 2024".into(),
            doc_id: id.into(),
            version_code: 12,
            star_rating: 4.256,
            offers,
        }
    }

    fn free() -> Vec<Offer> {
        vec![Offer {
            checkout_flow_required: false,
        }]
    }

    fn paid() -> Vec<Offer> {
        vec![Offer {
            checkout_flow_required: true,
        }]
    }

    #[test]
    fn test_filters_preregistration_and_paid() {
        let results = vec![
            result("com.free", free()),
            result("com.beta", Vec::new()),
            result("com.paid", paid()),
        ];

        let ids: Vec<&str> = filter_results(&results, 10, false)
            .iter()
            .map(|r| r.doc_id.as_str())
            .collect();
        assert_eq!(ids, vec!["com.free"]);

        let ids: Vec<&str> = filter_results(&results, 10, true)
            .iter()
            .map(|r| r.doc_id.as_str())
            .collect();
        assert_eq!(ids, vec!["com.free", "com.paid"]);
    }

    #[test]
    fn test_limit_applies_after_filtering() {
        let results = vec![
            result("com.paid", paid()),
            result("com.a", free()),
            result("com.b", free()),
            result("com.c", free()),
        ];
        let kept = filter_results(&results, 2, false);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].doc_id, "com.a");
    }

    #[test]
    fn test_row_formatting() {
        let r = result("com.a", free());
        let cells = row(&r);
        assert_eq!(cells[2], "1.5KiB");
        assert_eq!(cells[5], "com.a");
        assert_eq!(cells[7], "4.26");
    }

    #[test]
    fn test_table_has_header_and_rows() {
        let r = result("com.a", free());
        let text = render(&[&r]).to_string();
        assert!(text.contains("AppID"));
        assert!(text.contains("com.a"));
        assert!(text.contains("Title com.a"));
    }
}
