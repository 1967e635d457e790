//! Field extractors for scene detail pages.
//!
//! Every extractor is a pure function over a parsed document (or the raw
//! markup) returning one optional field. Extractors never fail: a missing
//! element simply yields `None` or an empty list.

mod normalize;
mod page;

pub use normalize::{normalize_date, normalize_url, parse_listing_date, upgrade_thumbnail_quality};
pub use page::{
    extract_date, extract_details, extract_embedded_thumbnail, extract_og_image,
    extract_page_fields, extract_performers, extract_preview_thumb, extract_studio_code,
    extract_studio_name, extract_tags, extract_title, PageFields,
};

use scraper::ElementRef;

/// Text of an element with every text node trimmed, blank nodes dropped,
/// and the rest joined without separators.
pub(crate) fn stripped_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Decode HTML entities left over after parsing (pages double-escape some
/// attributes).
pub(crate) fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
