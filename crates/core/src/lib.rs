pub mod cache;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod operation;
pub mod resolver;
pub mod scene;
pub mod search;
pub mod stash;
pub mod testing;

pub use cache::{CacheError, MemoryScrapeCache, ScrapeCache, SqliteScrapeCache};
pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
    LogFormat,
};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use operation::{Operation, OperationContext, OperationError, INPUT_ERROR_EXIT};
pub use resolver::{PageScraper, SceneResolver, ScrapeError};
pub use scene::{NamedEntry, ResolvedScene, SceneFragment, SceneRecord, SearchResult, Studio};
pub use search::SearchClient;
pub use stash::{
    apply_image_to_performer, image_id_from_input, PerformerImageOutcome, SkipReason, StashApi,
    StashClient, StashError,
};
