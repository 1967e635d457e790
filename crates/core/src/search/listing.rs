//! Parsing of search result pages into partial scene records.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::config::SiteConfig;
use crate::extract::{decode_entities, normalize_url, parse_listing_date, stripped_text};
use crate::scene::{NamedEntry, SearchResult, Studio};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static LISTING_CONTAINER: Lazy<Selector> = Lazy::new(|| selector("div[class*='latestUpdateB']"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static THUMB_IMG: Lazy<Selector> = Lazy::new(|| selector("img.update_thumb"));
static THUMB_VIDEO: Lazy<Selector> = Lazy::new(|| selector("video.update_thumb"));
static DATE_ITEM: Lazy<Selector> = Lazy::new(|| selector("li.text_med"));

static STUDIO_HREF_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[^/]+/$").expect("studio href pattern is valid"));

/// Listing variant that carries no scene and is always skipped.
const INFO_CONTAINER_CLASS: &str = "latestUpdateBinfo";

/// URL shapes that identify scene and performer links on listing pages.
#[derive(Debug, Clone)]
pub struct ListingPatterns {
    base_url: String,
    scene_prefix: String,
    performer_prefix: String,
}

impl ListingPatterns {
    pub fn new(site: &SiteConfig) -> Self {
        let base = site.base_url.trim_end_matches('/');
        Self {
            base_url: base.to_string(),
            scene_prefix: format!("{}/scenes/", base),
            performer_prefix: format!("{}/models/", base),
        }
    }

    /// `<base>/scenes/…_vids.html`
    fn is_scene_link(&self, href: &str) -> bool {
        href.find(&self.scene_prefix).is_some_and(|start| {
            href[start + self.scene_prefix.len()..].contains("_vids.html")
        })
    }

    fn is_performer_link(&self, href: &str) -> bool {
        href.contains(&self.performer_prefix)
    }
}

/// Results of one search page.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    /// Whether any result's title equals the query.
    pub has_exact_match: bool,
}

/// Parse every listing container on a search page.
pub fn parse_search_page(html: &str, query: &str, patterns: &ListingPatterns) -> SearchPage {
    let doc = Html::parse_document(html);
    let mut page = SearchPage::default();

    for container in doc.select(&LISTING_CONTAINER) {
        if container
            .value()
            .classes()
            .any(|class| class == INFO_CONTAINER_CLASS)
        {
            continue;
        }

        let scene_link = container.select(&LINK).find_map(|link| {
            let href = link.value().attr("href")?;
            if !patterns.is_scene_link(href) {
                return None;
            }
            let title = stripped_text(&link);
            (!title.is_empty()).then(|| (href.to_string(), title))
        });
        let Some((scene_url, title)) = scene_link else {
            continue;
        };

        let result = extract_search_result_data(&container, &scene_url, &title, patterns);
        if result.is_exact_match(query) {
            page.has_exact_match = true;
        }
        page.results.push(result);
    }

    page
}

/// Build a partial record from one listing container without fetching the
/// scene page. Details, tags and code are never filled in here.
pub fn extract_search_result_data(
    container: &ElementRef<'_>,
    scene_url: &str,
    title: &str,
    patterns: &ListingPatterns,
) -> SearchResult {
    let mut result = SearchResult::new(decode_entities(title.trim()).trim(), scene_url);

    result.image = listing_image(container, &patterns.base_url);

    if let Some(name) = first_link_text(container, |href| patterns.is_performer_link(href)) {
        result.performers = vec![NamedEntry::new(name)];
    }

    if let Some(name) = first_link_text(container, |href| STUDIO_HREF_REGEX.is_match(href)) {
        result.studio = Some(Studio {
            name: Some(name),
            url: None,
        });
    }

    result.date = container
        .select(&DATE_ITEM)
        .find_map(|item| parse_listing_date(&stripped_text(&item)));

    if result.date.is_none() {
        debug!(url = scene_url, "Listing has no parseable date");
    }

    result
}

/// Highest-resolution thumbnail: `img` sources first, then `video` posters.
fn listing_image(container: &ElementRef<'_>, base_url: &str) -> Option<String> {
    let candidates: (&[&str], Option<ElementRef<'_>>) =
        match container.select(&THUMB_IMG).next() {
            Some(img) => (&["src0_2x", "src0_1x", "src"], Some(img)),
            None => (
                &["poster_2x", "poster_1x", "poster"],
                container.select(&THUMB_VIDEO).next(),
            ),
        };

    let (attributes, element) = candidates;
    let element = element?;
    attributes
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find(|value| !value.trim().is_empty())
        .and_then(|value| normalize_url(base_url, value))
}

fn first_link_text<F>(container: &ElementRef<'_>, matches_href: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    container
        .select(&LINK)
        .find(|link| link.value().attr("href").is_some_and(&matches_href))
        .map(|link| decode_entities(&stripped_text(&link)))
        .filter(|text| !text.is_empty())
}
