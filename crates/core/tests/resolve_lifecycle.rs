//! Resolve lifecycle integration tests.
//!
//! These tests drive the full pipeline (operation context, resolver, page
//! scraper, search client) over a mock fetcher:
//! - URL candidates and host filtering
//! - Title and file-name search fallback
//! - Exact-match preference and search paging
//! - Read-through caching

use std::sync::Arc;

use tempfile::TempDir;

use meanworld_core::{
    testing::{
        fixtures::{self, Listing, ListingImage, ScenePage},
        MockFetcher,
    },
    Config, Operation, OperationContext, ResolvedScene, SceneFragment, ScrapeCache,
    SqliteScrapeCache,
};

/// Test helper wiring an operation context to a mock fetcher.
struct TestHarness {
    fetcher: Arc<MockFetcher>,
    context: OperationContext,
}

impl TestHarness {
    fn new() -> Self {
        let fetcher = Arc::new(MockFetcher::new());
        let context = OperationContext::new(fetcher.clone(), &Config::default(), None);
        Self { fetcher, context }
    }

    fn with_cache(cache: Arc<dyn ScrapeCache>) -> Self {
        let fetcher = Arc::new(MockFetcher::new());
        let context = OperationContext::new(fetcher.clone(), &Config::default(), Some(cache));
        Self { fetcher, context }
    }

    fn search_url(&self, query: &str, page: u32) -> String {
        self.context
            .resolver()
            .scraper()
            .search_client()
            .build_search_url(query, page)
    }

    /// Serve a minimal scene page with an image so no search fallback runs.
    fn serve_scene(&self, slug: &str, title: &str) -> String {
        let url = fixtures::scene_url(slug);
        self.fetcher.set_page(
            &url,
            fixtures::scene_page(&ScenePage {
                title,
                og_image: Some("/content/scene.jpg"),
                ..ScenePage::default()
            }),
        );
        url
    }

    async fn resolve(&self, fragment: &SceneFragment, prefer_exact: bool) -> ResolvedScene {
        self.context
            .resolver()
            .resolve(fragment, prefer_exact)
            .await
            .expect("resolve should not fail")
    }
}

fn resolved_title(resolved: &ResolvedScene) -> Option<&str> {
    resolved.record().and_then(|r| r.title.as_deref())
}

#[tokio::test]
async fn test_file_name_becomes_search_query() {
    let harness = TestHarness::new();
    let url = harness.serve_scene("Some-Scene-Title", "Some Scene Title");
    harness.fetcher.set_page(
        &harness.search_url("Some Scene Title", 1),
        fixtures::search_page(&[Listing::new("Some Scene Title", "Some-Scene-Title")]),
    );

    let fragment: SceneFragment =
        serde_json::from_str(r#"{"file_name": "/videos/Some Scene Title.mp4"}"#).unwrap();
    let resolved = harness.resolve(&fragment, true).await;

    assert_eq!(resolved_title(&resolved), Some("Some Scene Title"));
    assert_eq!(
        harness.fetcher.requested_urls(),
        vec![
            harness.search_url("Some Scene Title", 1),
            url,
        ]
    );
}

#[tokio::test]
async fn test_exact_match_stops_paging_after_first_page() {
    let harness = TestHarness::new();
    harness.fetcher.set_page(
        &harness.search_url("Exact Title", 1),
        fixtures::search_page(&[
            Listing::new("Exact Title Part 2", "Exact-Title-2"),
            Listing::new("Exact Title", "Exact-Title"),
        ]),
    );
    harness.fetcher.set_page(
        &harness.search_url("Exact Title", 2),
        fixtures::search_page(&[Listing::new("Exact Title Again", "Exact-Title-3")]),
    );

    let output = harness
        .context
        .run(Operation::SearchScenes, r#"{"name": "Exact Title"}"#)
        .await
        .unwrap();

    let titles: Vec<&str> = output
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Exact Title", "Exact Title Part 2"]);
    assert_eq!(harness.fetcher.request_count(), 1);
}

#[tokio::test]
async fn test_not_found_url_falls_back_to_title_search() {
    let harness = TestHarness::new();
    let dead = fixtures::scene_url("Dead-Link");
    harness.fetcher.set_status(&dead, 404);
    let live = harness.serve_scene("Boss-Lady", "Boss Lady");
    harness.fetcher.set_page(
        &harness.search_url("Boss Lady", 1),
        fixtures::search_page(&[Listing::new("Boss Lady", "Boss-Lady")]),
    );

    let fragment = SceneFragment {
        url: Some(dead.clone()),
        title: Some("Boss Lady".to_string()),
        ..SceneFragment::default()
    };
    let resolved = harness.resolve(&fragment, false).await;

    assert_eq!(resolved_title(&resolved), Some("Boss Lady"));
    assert_eq!(
        resolved.record().unwrap().url.as_deref(),
        Some(live.as_str())
    );
    assert_eq!(harness.fetcher.requests_for(&dead), 1);
}

#[tokio::test]
async fn test_missing_image_borrowed_from_top_search_result() {
    let harness = TestHarness::new();
    let url = fixtures::scene_url("No-Art");
    harness.fetcher.set_page(
        &url,
        fixtures::scene_page(&ScenePage {
            title: "No Art",
            ..ScenePage::default()
        }),
    );
    harness.fetcher.set_page(
        &harness.search_url("No Art", 1),
        fixtures::search_page(&[
            Listing {
                image: Some(ListingImage::Img("/content/no-art-2x.jpg")),
                ..Listing::new("No Art", "No-Art")
            },
            Listing {
                image: Some(ListingImage::Img("/content/other.jpg")),
                ..Listing::new("Something Else", "Something-Else")
            },
        ]),
    );

    let input = serde_json::json!({ "url": url }).to_string();
    let output = harness
        .context
        .run(Operation::ScrapeSceneUrl, &input)
        .await
        .unwrap();

    assert_eq!(
        output["image"],
        "https://megasite.meanworld.com/content/no-art-2x.jpg"
    );
    // Only the scene page and one search page: the listing is not scraped.
    assert_eq!(harness.fetcher.request_count(), 2);
}

#[tokio::test]
async fn test_foreign_hosts_are_never_fetched() {
    let harness = TestHarness::new();
    let local = harness.serve_scene("Local", "Local Scene");

    let fragment = SceneFragment {
        urls: Some(vec![
            "https://www.example.com/scenes/Local_vids.html".to_string(),
            "https://megasite.meanworld.com.mirror.net/scenes/Local_vids.html".to_string(),
            "/scenes/Local_vids.html".to_string(),
            local.clone(),
        ]),
        ..SceneFragment::default()
    };
    let resolved = harness.resolve(&fragment, true).await;

    assert_eq!(resolved_title(&resolved), Some("Local Scene"));
    assert_eq!(harness.fetcher.requested_urls(), vec![local]);
}

#[tokio::test]
async fn test_untitled_page_tries_next_candidate() {
    let harness = TestHarness::new();
    let blank = fixtures::scene_url("Blank");
    harness.fetcher.set_page(&blank, "<html><body>Maintenance</body></html>");
    let good = harness.serve_scene("Good", "Good Scene");

    let fragment = SceneFragment {
        urls: Some(vec![blank.clone()]),
        url: Some(good.clone()),
        ..SceneFragment::default()
    };
    let resolved = harness.resolve(&fragment, true).await;

    assert_eq!(resolved_title(&resolved), Some("Good Scene"));
}

#[tokio::test]
async fn test_enrich_picks_case_insensitive_exact_title() {
    let harness = TestHarness::new();
    harness.serve_scene("Heels-Two", "Heels 2");
    harness.serve_scene("Heels", "heels");
    harness.fetcher.set_page(
        &harness.search_url("HEELS", 1),
        fixtures::search_page(&[
            Listing::new("Heels 2", "Heels-Two"),
            Listing::new("heels", "Heels"),
        ]),
    );

    let enriched = harness
        .resolve(&fixtures::titled_fragment("HEELS"), true)
        .await;
    assert_eq!(resolved_title(&enriched), Some("heels"));
}

#[tokio::test]
async fn test_query_without_exact_preference_takes_first_ranked() {
    let harness = TestHarness::new();
    harness.serve_scene("Office-Party", "Office Party");
    harness.serve_scene("Office-Party-Redux", "THE OFFICE PARTY REDUX");
    harness.fetcher.set_page(
        &harness.search_url("office party redux", 1),
        fixtures::search_page(&[
            Listing::new("Office Party", "Office-Party"),
            Listing::new("THE OFFICE PARTY REDUX", "Office-Party-Redux"),
        ]),
    );

    let fragment = fixtures::titled_fragment("office party redux");
    let queried = harness.resolve(&fragment, false).await;
    // Ranking ignores case, so the closer upper-case title wins.
    assert_eq!(resolved_title(&queried), Some("THE OFFICE PARTY REDUX"));
}

#[tokio::test]
async fn test_scrape_error_on_search_pick_propagates() {
    let harness = TestHarness::new();
    let broken = fixtures::scene_url("Broken");
    harness.fetcher.set_status(&broken, 500);
    harness.fetcher.set_page(
        &harness.search_url("Broken", 1),
        fixtures::search_page(&[Listing::new("Broken", "Broken")]),
    );

    let result = harness
        .context
        .resolver()
        .resolve(&fixtures::titled_fragment("Broken"), true)
        .await;
    assert!(result.is_err());

    let err = harness
        .context
        .run(Operation::EnrichScene, r#"{"title": "Broken"}"#)
        .await
        .unwrap_err();
    assert!(!err.is_input_error());
}

#[tokio::test]
async fn test_unresolved_fragment_echoes_input() {
    let harness = TestHarness::new();
    harness
        .fetcher
        .set_page(&harness.search_url("Nothing Matches", 1), fixtures::search_page(&[]));

    let input = r#"{"title": "Nothing Matches", "id": "17", "tags": [{"name": "x"}]}"#;
    let output = harness
        .context
        .run(Operation::QueryScene, input)
        .await
        .unwrap();

    let expected: serde_json::Value = serde_json::from_str(input).unwrap();
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_warm_cache_is_idempotent_without_refetch() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let cache = Arc::new(
        SqliteScrapeCache::new(&dir.path().join("cache.db")).expect("Failed to open cache"),
    );
    let harness = TestHarness::with_cache(cache);
    let url = harness.serve_scene("Warm", "Warm Scene");

    let fragment = fixtures::url_fragment(&url);
    let first = harness.resolve(&fragment, true).await;
    let second = harness.resolve(&fragment, true).await;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    assert_eq!(harness.fetcher.requests_for(&url), 1);
}

#[tokio::test]
async fn test_gallery_operation_uses_photographer() {
    let harness = TestHarness::new();
    let url = harness.serve_scene("Gallery", "Gallery Set");

    let input = serde_json::json!({ "url": url }).to_string();
    let output = harness
        .context
        .run(Operation::ScrapeGalleryUrl, &input)
        .await
        .unwrap();

    assert_eq!(output["photographer"], "Glenn King");
    assert!(output.get("director").is_none());
}
