//! URL and date normalization shared by page and listing extraction.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Thumbnail variants served at 1x-4x; the 4x file lives under a different
/// (double-slash) content path.
static THUMB_QUALITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/meanbitches/content/contentthumbs/(.*)-[1234]x\.jpg$")
        .expect("thumbnail quality pattern is valid")
});

static LISTING_DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}").expect("listing date pattern is valid"));

/// Make a site URL absolute. Root-relative paths get `base_url` prepended;
/// anything else is returned trimmed. Blank input yields `None`.
pub fn normalize_url(base_url: &str, url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    if url.starts_with('/') {
        Some(format!("{}{}", base_url.trim_end_matches('/'), url))
    } else {
        Some(url.to_string())
    }
}

/// `m/d/yyyy` becomes `yyyy-mm-dd`; any other string passes through as is.
pub fn normalize_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Listing dates must be the whole text of the element and must parse.
pub fn parse_listing_date(text: &str) -> Option<String> {
    if !LISTING_DATE_REGEX.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Rewrite any 1x-4x content thumbnail to its 4x variant.
pub fn upgrade_thumbnail_quality(url: &str) -> String {
    THUMB_QUALITY_REGEX
        .replace(url, "/content//contentthumbs/${1}-4x.jpg")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://megasite.meanworld.com";

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url(BASE, " /content/a.jpg ").as_deref(),
            Some("https://megasite.meanworld.com/content/a.jpg")
        );
        assert_eq!(
            normalize_url("https://megasite.meanworld.com/", "/x").as_deref(),
            Some("https://megasite.meanworld.com/x")
        );
        assert_eq!(
            normalize_url(BASE, "https://cdn.example/a.jpg").as_deref(),
            Some("https://cdn.example/a.jpg")
        );
        assert_eq!(normalize_url(BASE, "   "), None);
    }

    #[test]
    fn test_normalize_date_pads_month_and_day() {
        assert_eq!(normalize_date("1/5/2020"), "2020-01-05");
        assert_eq!(normalize_date("12/31/1999"), "1999-12-31");
        assert_eq!(normalize_date("03/07/2021"), "2021-03-07");
    }

    #[test]
    fn test_normalize_date_keeps_unparseable_input() {
        assert_eq!(normalize_date("13/45/2020"), "13/45/2020");
        assert_eq!(normalize_date("2020-01-05"), "2020-01-05");
        assert_eq!(normalize_date("sometime"), "sometime");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn test_parse_listing_date_requires_whole_text() {
        assert_eq!(parse_listing_date("4/9/2019").as_deref(), Some("2019-04-09"));
        assert_eq!(parse_listing_date("Added 4/9/2019"), None);
        assert_eq!(parse_listing_date("4/9/2019 by someone"), None);
        assert_eq!(parse_listing_date("2/30/2019"), None);
    }

    #[test]
    fn test_upgrade_thumbnail_quality() {
        assert_eq!(
            upgrade_thumbnail_quality(
                "https://megasite.meanworld.com/meanbitches/content/contentthumbs/12/34/5678-2x.jpg"
            ),
            "https://megasite.meanworld.com/content//contentthumbs/12/34/5678-4x.jpg"
        );
        let untouched = "https://megasite.meanworld.com/content/other/5678-2x.jpg";
        assert_eq!(upgrade_thumbnail_quality(untouched), untouched);
    }
}
