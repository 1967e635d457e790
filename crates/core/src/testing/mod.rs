//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! plus HTML builders shaped like the site's markup, allowing the full
//! resolve pipeline to be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use meanworld_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.set_page(
//!     &fixtures::scene_url("Boss-Lady"),
//!     fixtures::scene_page(&fixtures::ScenePage {
//!         title: "Boss Lady",
//!         ..Default::default()
//!     }),
//! );
//! ```

mod mock_fetcher;
mod mock_stash;

pub use mock_fetcher::{MockFetcher, RecordedRequest};
pub use mock_stash::MockStash;

/// Test fixtures and helper functions.
///
/// Strings are inserted into the markup verbatim, so tests can feed in
/// entity-escaped text and check how it is decoded.
pub mod fixtures {
    use crate::scene::SceneFragment;

    /// Default site root, matching `SiteConfig::default()`.
    pub const BASE_URL: &str = "https://megasite.meanworld.com";

    /// Absolute scene URL for a slug.
    pub fn scene_url(slug: &str) -> String {
        format!("{}/scenes/{}_vids.html", BASE_URL, slug)
    }

    /// Scene detail page contents.
    #[derive(Debug, Clone)]
    pub struct ScenePage<'a> {
        pub title: &'a str,
        /// Description paragraph; `None` renders "About {title}."
        pub details: Option<&'a str>,
        pub studio: Option<&'a str>,
        pub performers: &'a [&'a str],
        pub tags: &'a [&'a str],
        /// Raw `m/d/yyyy` text for the date list item.
        pub date: Option<&'a str>,
        pub og_image: Option<&'a str>,
        pub preview_thumb: Option<&'a str>,
        pub embedded_thumbnail: Option<&'a str>,
        pub code: Option<&'a str>,
    }

    impl Default for ScenePage<'_> {
        fn default() -> Self {
            Self {
                title: "",
                details: None,
                studio: Some("Mean Bitches"),
                performers: &[],
                tags: &[],
                date: None,
                og_image: None,
                preview_thumb: None,
                embedded_thumbnail: None,
                code: None,
            }
        }
    }

    /// Render a scene detail page.
    pub fn scene_page(page: &ScenePage<'_>) -> String {
        let mut head = String::new();
        if let Some(og_image) = page.og_image {
            head.push_str(&format!(
                r#"<meta property="og:image" content="{}">"#,
                og_image
            ));
        }

        let mut body = String::new();
        body.push_str(&format!(
            r#"<div id="packageinfo_1001" class="packageinfo" data-title="{}"></div>"#,
            page.title
        ));

        if let Some(studio) = page.studio {
            body.push_str(&format!(
                r#"<div class="sitename"><a class="link_bright" href="/{}/">{}</a></div>"#,
                studio.replace(' ', ""),
                studio
            ));
        }

        body.push_str(r#"<div class="models">"#);
        for performer in page.performers {
            body.push_str(&format!(
                r#"<a class="link_bright infolink" href="{}/models/{}.html">{}</a>"#,
                BASE_URL,
                performer.replace(' ', "-"),
                performer
            ));
        }
        body.push_str("</div>");

        let details = page
            .details
            .map(str::to_string)
            .unwrap_or_else(|| format!("About {}.", page.title));
        body.push_str(&format!(
            r#"<div class="vidImgContent clear"><p>{}</p></div>"#,
            details
        ));

        body.push_str(r#"<ul class="videoInfo"><li class="text_med">HD Video</li>"#);
        if let Some(date) = page.date {
            body.push_str(&format!(
                r#"<li class="text_med">Added: <span>{}</span></li>"#,
                date
            ));
        }
        body.push_str("</ul>");

        if !page.tags.is_empty() {
            body.push_str(r#"<div class="blogTags"><ul>"#);
            for tag in page.tags {
                body.push_str(&format!(
                    r#"<li><a class="border_btn" href="/tags/{}.html">{}</a></li>"#,
                    tag.replace(' ', "-"),
                    tag
                ));
            }
            body.push_str("</ul></div>");
        }

        if let Some(thumb) = page.preview_thumb {
            body.push_str(&format!(
                r#"<img class="stdimage dvd_preview_thumb" src="{}">"#,
                thumb
            ));
        }

        if let Some(code) = page.code {
            body.push_str(&format!(
                r#"<img class="stdimage" src="/content//upload/{}/preview/1.jpg">"#,
                code
            ));
        }

        if let Some(thumbnail) = page.embedded_thumbnail {
            body.push_str(&format!(
                r#"<script>jwplayer("player").setup({{ file: "/trailer.mp4", thumbnail: "{}" }});</script>"#,
                thumbnail
            ));
        }

        format!(
            "<!DOCTYPE html><html><head>{}</head><body>{}</body></html>",
            head, body
        )
    }

    /// Thumbnail element of a search listing.
    #[derive(Debug, Clone, Copy)]
    pub enum ListingImage<'a> {
        /// `<img class="update_thumb" src0_2x=…>`
        Img(&'a str),
        /// `<video class="update_thumb" poster_1x=…>`
        Video(&'a str),
    }

    /// One search listing container.
    #[derive(Debug, Clone)]
    pub struct Listing<'a> {
        pub title: &'a str,
        pub slug: &'a str,
        pub performer: Option<&'a str>,
        pub studio: Option<&'a str>,
        pub date: Option<&'a str>,
        pub image: Option<ListingImage<'a>>,
    }

    impl<'a> Listing<'a> {
        pub fn new(title: &'a str, slug: &'a str) -> Self {
            Self {
                title,
                slug,
                performer: None,
                studio: None,
                date: None,
                image: None,
            }
        }
    }

    /// Render a search result page holding `listings` in order.
    pub fn search_page(listings: &[Listing<'_>]) -> String {
        let mut body = String::from(
            r#"<div class="latestUpdateB latestUpdateBinfo"><a href="/join.html">Join now</a></div>"#,
        );

        for listing in listings {
            let url = scene_url(listing.slug);
            let mut container = String::from(r#"<div class="latestUpdateB">"#);

            match listing.image {
                Some(ListingImage::Img(src)) => container.push_str(&format!(
                    r#"<a href="{}"><img class="update_thumb" src0_2x="{}"></a>"#,
                    url, src
                )),
                Some(ListingImage::Video(poster)) => container.push_str(&format!(
                    r#"<video class="update_thumb" poster_1x="{}"></video>"#,
                    poster
                )),
                None => {}
            }

            container.push_str(&format!(
                r#"<h4><a href="{}">{}</a></h4>"#,
                url, listing.title
            ));

            if let Some(performer) = listing.performer {
                container.push_str(&format!(
                    r#"<a href="{}/models/{}.html">{}</a>"#,
                    BASE_URL,
                    performer.replace(' ', "-"),
                    performer
                ));
            }
            if let Some(studio) = listing.studio {
                container.push_str(&format!(
                    r#"<a href="/{}/">{}</a>"#,
                    studio.replace(' ', ""),
                    studio
                ));
            }

            container.push_str("<ul>");
            if let Some(date) = listing.date {
                container.push_str(&format!(r#"<li class="text_med">{}</li>"#, date));
            }
            container.push_str("</ul></div>");

            body.push_str(&container);
        }

        format!("<html><body>{}</body></html>", body)
    }

    /// A fragment carrying only a title.
    pub fn titled_fragment(title: &str) -> SceneFragment {
        SceneFragment {
            title: Some(title.to_string()),
            ..SceneFragment::default()
        }
    }

    /// A fragment carrying only a URL.
    pub fn url_fragment(url: &str) -> SceneFragment {
        SceneFragment {
            url: Some(url.to_string()),
            ..SceneFragment::default()
        }
    }
}
