//! Extractors for a scene/gallery detail page.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use super::normalize::{normalize_date, normalize_url, upgrade_thumbnail_quality};
use super::{decode_entities, stripped_text};
use crate::scene::NamedEntry;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static DIV_WITH_ID: Lazy<Selector> = Lazy::new(|| selector("div[id]"));
static DESCRIPTION_DIV: Lazy<Selector> = Lazy::new(|| selector("div[class*='vidImgContent']"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static BRIGHT_LINK: Lazy<Selector> = Lazy::new(|| selector("a.link_bright"));
static CLASSED_LINK: Lazy<Selector> = Lazy::new(|| selector("a[class]"));
static OG_IMAGE: Lazy<Selector> = Lazy::new(|| selector("meta[property='og:image']"));
static PREVIEW_THUMB: Lazy<Selector> = Lazy::new(|| selector("img[class*='dvd_preview_thumb']"));
static DATE_ITEM: Lazy<Selector> = Lazy::new(|| selector("li[class*='text_med']"));
static TAG_CONTAINER: Lazy<Selector> = Lazy::new(|| selector("div[class*='blogTags']"));
static TAG_LINK: Lazy<Selector> = Lazy::new(|| selector("a[class*='border_btn']"));

static PACKAGE_ID_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"packageinfo_\d+").expect("package id pattern is valid"));
static PERFORMER_CLASS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"link_bright.*infolink").expect("performer class pattern is valid"));
static DATE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}/\d{1,2}/\d{4})").expect("date pattern is valid"));
static EMBEDDED_THUMB_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"thumbnail:\s*"([^"]*\.jpg)""#).expect("embedded thumbnail pattern is valid")
});
static UPLOAD_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/content//upload/([^/]+)/").expect("upload code pattern is valid"));

/// Title from the `data-title` attribute of the `packageinfo_<n>` container.
pub fn extract_title(doc: &Html) -> Option<String> {
    let package = doc.select(&DIV_WITH_ID).find(|div| {
        div.value()
            .id()
            .is_some_and(|id| PACKAGE_ID_REGEX.is_match(id))
    });
    let Some(package) = package else {
        debug!("No packageinfo container on page");
        return None;
    };

    package
        .value()
        .attr("data-title")
        .map(|title| decode_entities(title).trim().to_string())
        .filter(|title| !title.is_empty())
}

/// First paragraph of the description block.
pub fn extract_details(doc: &Html) -> Option<String> {
    let container = doc.select(&DESCRIPTION_DIV).next()?;
    let paragraph = container.select(&PARAGRAPH).next()?;
    Some(decode_entities(&stripped_text(&paragraph))).filter(|d| !d.is_empty())
}

/// Studio links are the bright links with a root-relative target.
pub fn extract_studio_name(doc: &Html) -> Option<String> {
    doc.select(&BRIGHT_LINK)
        .find(|link| {
            link.value()
                .attr("href")
                .is_some_and(|href| href.starts_with('/'))
        })
        .map(|link| decode_entities(&stripped_text(&link)))
        .filter(|name| !name.is_empty())
}

/// Every `link_bright … infolink` anchor, in document order. Duplicate names
/// are kept.
pub fn extract_performers(doc: &Html) -> Vec<NamedEntry> {
    doc.select(&CLASSED_LINK)
        .filter(|link| {
            link.value()
                .attr("class")
                .is_some_and(|class| PERFORMER_CLASS_REGEX.is_match(class))
        })
        .map(|link| stripped_text(&link))
        .filter(|name| !name.is_empty())
        .map(|name| NamedEntry::new(decode_entities(&name)))
        .collect()
}

/// Image strategy 1: the `og:image` meta tag, upgraded to the 4x variant.
pub fn extract_og_image(doc: &Html, base_url: &str) -> Option<String> {
    let content = doc
        .select(&OG_IMAGE)
        .next()?
        .value()
        .attr("content")
        .unwrap_or_default()
        .trim();

    // The site emits a bare directory when a scene has no artwork.
    if content.is_empty() || content.ends_with("contentthumbs/") {
        return None;
    }

    normalize_url(base_url, &upgrade_thumbnail_quality(content))
}

/// Image strategy 2: the DVD preview thumbnail.
pub fn extract_preview_thumb(doc: &Html, base_url: &str) -> Option<String> {
    let src = doc.select(&PREVIEW_THUMB).next()?.value().attr("src")?;
    normalize_url(base_url, src)
}

/// Image strategy 4: a thumbnail referenced from inline player script.
pub fn extract_embedded_thumbnail(html: &str, base_url: &str) -> Option<String> {
    let caps = EMBEDDED_THUMB_REGEX.captures(html)?;
    normalize_url(base_url, caps.get(1)?.as_str())
}

/// First `m/d/yyyy` token in a `text_med` list item. Unparseable dates are
/// returned raw.
pub fn extract_date(doc: &Html) -> Option<String> {
    doc.select(&DATE_ITEM).find_map(|item| {
        let text = stripped_text(&item);
        let raw = DATE_REGEX.captures(&text)?.get(1)?.as_str().trim().to_string();
        let date = normalize_date(&raw);
        if date == raw {
            debug!(date = %raw, "Could not parse page date, keeping raw value");
        }
        Some(date)
    })
}

/// Tag buttons inside the first tag container.
pub fn extract_tags(doc: &Html) -> Vec<NamedEntry> {
    let Some(container) = doc.select(&TAG_CONTAINER).next() else {
        return Vec::new();
    };
    container
        .select(&TAG_LINK)
        .map(|link| stripped_text(&link))
        .filter(|name| !name.is_empty())
        .map(|name| NamedEntry::new(decode_entities(&name)))
        .collect()
}

/// Studio code from the upload path. Not reliably inside a stable element,
/// so this matches on raw markup.
pub fn extract_studio_code(html: &str) -> Option<String> {
    UPLOAD_CODE_REGEX
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Everything that can be read from one page without further requests.
///
/// `image` holds the result of strategies 1-2 and `embedded_thumbnail` the
/// result of strategy 4; the search-backed strategy 3 runs in between and is
/// applied by the page scraper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageFields {
    pub title: Option<String>,
    pub details: Option<String>,
    pub studio_name: Option<String>,
    pub performers: Vec<NamedEntry>,
    pub image: Option<String>,
    pub embedded_thumbnail: Option<String>,
    pub date: Option<String>,
    pub tags: Vec<NamedEntry>,
    pub code: Option<String>,
}

/// Parse `html` once and run every extractor against it.
pub fn extract_page_fields(html: &str, base_url: &str) -> PageFields {
    let doc = Html::parse_document(html);

    let image = extract_og_image(&doc, base_url).or_else(|| extract_preview_thumb(&doc, base_url));

    PageFields {
        title: extract_title(&doc),
        details: extract_details(&doc),
        studio_name: extract_studio_name(&doc),
        performers: extract_performers(&doc),
        image,
        embedded_thumbnail: extract_embedded_thumbnail(html, base_url),
        date: extract_date(&doc),
        tags: extract_tags(&doc),
        code: extract_studio_code(html),
    }
}
