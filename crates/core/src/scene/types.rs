//! Types for scene fragments and records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A partial scene description supplied by the host.
///
/// Keys other than the four the resolver reads are kept in `extra` so that an
/// unresolved fragment can be handed back exactly as it arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SceneFragment {
    /// Candidate URLs in resolution order: `urls` first, then `url` if new.
    pub fn candidate_urls(&self) -> Vec<String> {
        let mut candidates: Vec<String> = self.urls.clone().unwrap_or_default();
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            if !candidates.iter().any(|c| c == url) {
                candidates.push(url.to_string());
            }
        }
        candidates
    }

    /// Title to search for: the fragment title, else the file name stem.
    pub fn search_title(&self) -> Option<String> {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| self.file_name.as_deref().and_then(title_from_file_name))
    }
}

/// Derive a title from a video path by dropping directories and extension.
pub fn title_from_file_name(file_name: &str) -> Option<String> {
    let file_name = file_name.trim();
    if file_name.is_empty() {
        return None;
    }
    std::path::Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// A `{name}` entry, used for performers and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

impl NamedEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Studio reference. Full-page scrapes always carry the canonical `url`;
/// search listings only carry the `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Studio {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A scraped scene or gallery.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio: Option<Studio>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performers: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
}

impl SceneRecord {
    /// Start an empty record for `url`.
    pub fn builder(url: impl Into<String>) -> SceneRecordBuilder {
        SceneRecordBuilder::new(url)
    }

    /// A record without a title is a failed scrape.
    pub fn has_title(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Convert a scene record into its gallery form: same content,
    /// the credit moves from `director` to `photographer`.
    pub fn into_gallery(mut self) -> Self {
        if let Some(credit) = self.director.take() {
            self.photographer = Some(credit);
        }
        self
    }
}

/// Progressive builder for [`SceneRecord`]. `None` and empty values are
/// ignored so extractor output can be fed in directly.
#[derive(Debug, Clone, Default)]
pub struct SceneRecordBuilder {
    record: SceneRecord,
}

impl SceneRecordBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            record: SceneRecord {
                url: Some(url.into()),
                ..SceneRecord::default()
            },
        }
    }

    pub fn title(mut self, title: Option<String>) -> Self {
        self.record.title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub fn details(mut self, details: Option<String>) -> Self {
        self.record.details = details.filter(|d| !d.is_empty());
        self
    }

    pub fn studio(mut self, name: Option<String>, url: impl Into<String>) -> Self {
        self.record.studio = Some(Studio {
            name: name.filter(|n| !n.is_empty()),
            url: Some(url.into()),
        });
        self
    }

    pub fn performers(mut self, performers: Vec<NamedEntry>) -> Self {
        self.record.performers = performers;
        self
    }

    pub fn image(mut self, image: Option<String>) -> Self {
        self.record.image = image.filter(|i| !i.is_empty());
        self
    }

    pub fn date(mut self, date: Option<String>) -> Self {
        self.record.date = date.filter(|d| !d.is_empty());
        self
    }

    pub fn tags(mut self, tags: Vec<NamedEntry>) -> Self {
        self.record.tags = tags;
        self
    }

    pub fn code(mut self, code: Option<String>) -> Self {
        self.record.code = code.filter(|c| !c.is_empty());
        self
    }

    pub fn director(mut self, director: impl Into<String>) -> Self {
        self.record.director = Some(director.into());
        self
    }

    pub fn build(self) -> SceneRecord {
        self.record
    }
}

/// One listing from the search endpoint. Never carries details, tags or code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performers: Vec<NamedEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio: Option<Studio>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            image: None,
            performers: Vec::new(),
            studio: None,
            date: None,
        }
    }

    /// Case-insensitive, whitespace-trimmed title equality.
    pub fn is_exact_match(&self, query: &str) -> bool {
        titles_match(&self.title, query)
    }
}

/// Exact-match rule shared by search paging and the resolver.
pub fn titles_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Outcome of resolving a fragment: a scraped record, or the fragment
/// handed back untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedScene {
    Record(SceneRecord),
    Unresolved(SceneFragment),
}

impl ResolvedScene {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedScene::Record(_))
    }

    pub fn record(&self) -> Option<&SceneRecord> {
        match self {
            ResolvedScene::Record(record) => Some(record),
            ResolvedScene::Unresolved(_) => None,
        }
    }
}
