//! Stash integration: copy an image onto its performer's profile.
//!
//! The host library is reached through the [`StashApi`] trait so the flow in
//! [`apply_image_to_performer`] can run against [`StashClient`] or a mock.

mod client;

pub use client::StashClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

/// Errors talking to the Stash GraphQL endpoint.
#[derive(Debug, Error)]
pub enum StashError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for StashError {
    fn from(err: reqwest::Error) -> Self {
        StashError::Http(err.to_string())
    }
}

/// A performer as returned by Stash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashPerformer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePaths {
    #[serde(default)]
    pub image: Option<String>,
}

/// An image with the performers tagged on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashImage {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub paths: ImagePaths,
    #[serde(default)]
    pub performers: Vec<StashPerformer>,
}

impl StashImage {
    /// The full-size image URL, if Stash has one.
    pub fn image_url(&self) -> Option<&str> {
        self.paths.image.as_deref().filter(|p| !p.is_empty())
    }
}

/// Host library queries and mutations used by the performer image tool.
#[async_trait]
pub trait StashApi: Send + Sync {
    /// Look up an image by id. `Ok(None)` when Stash knows no such image.
    async fn find_image(&self, id: &str) -> Result<Option<StashImage>, StashError>;

    /// Set a performer's profile image. `Ok(None)` when the mutation
    /// returned no performer.
    async fn update_performer_image(
        &self,
        performer_id: &str,
        image_url: &str,
    ) -> Result<Option<StashPerformer>, StashError>;
}

/// Why the tool declined to update anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingImageId,
    ImageNotFound(String),
    NoImagePath(String),
    NoPerformers(String),
    MultiplePerformers { image_id: String, count: usize },
    UpdateReturnedNothing(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingImageId => write!(f, "no image id in input"),
            SkipReason::ImageNotFound(id) => write!(f, "image {} not found", id),
            SkipReason::NoImagePath(id) => write!(f, "image {} has no image path", id),
            SkipReason::NoPerformers(id) => write!(f, "image {} has no performers", id),
            SkipReason::MultiplePerformers { image_id, count } => write!(
                f,
                "image {} has {} performers, refusing to guess",
                image_id, count
            ),
            SkipReason::UpdateReturnedNothing(id) => {
                write!(f, "performer update for {} returned nothing", id)
            }
        }
    }
}

/// Result of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerformerImageOutcome {
    Updated {
        performer: StashPerformer,
        image_url: String,
    },
    Skipped(SkipReason),
}

/// Read the image id from an input fragment. Accepts a string or a number.
pub fn image_id_from_input(input: &serde_json::Value) -> Option<String> {
    match input.get("id")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Set the single performer on an image to use that image as their profile
/// picture. Every precondition failure is a [`SkipReason`]; only transport
/// and GraphQL failures are errors.
pub async fn apply_image_to_performer(
    api: &dyn StashApi,
    image_id: Option<&str>,
) -> Result<PerformerImageOutcome, StashError> {
    let outcome = run(api, image_id).await?;

    match &outcome {
        PerformerImageOutcome::Updated {
            performer,
            image_url,
        } => info!(
            performer_id = %performer.id,
            performer = %performer.name,
            image = %image_url,
            "Updated performer image"
        ),
        PerformerImageOutcome::Skipped(reason) => error!(reason = %reason, "Skipping image"),
    }

    Ok(outcome)
}

async fn run(
    api: &dyn StashApi,
    image_id: Option<&str>,
) -> Result<PerformerImageOutcome, StashError> {
    use PerformerImageOutcome::Skipped;

    let Some(image_id) = image_id.filter(|id| !id.is_empty()) else {
        return Ok(Skipped(SkipReason::MissingImageId));
    };

    let Some(image) = api.find_image(image_id).await? else {
        return Ok(Skipped(SkipReason::ImageNotFound(image_id.to_string())));
    };

    let Some(image_url) = image.image_url().map(str::to_string) else {
        return Ok(Skipped(SkipReason::NoImagePath(image.id)));
    };

    let performer = match image.performers.as_slice() {
        [] => return Ok(Skipped(SkipReason::NoPerformers(image.id))),
        [only] => only,
        many => {
            return Ok(Skipped(SkipReason::MultiplePerformers {
                image_id: image.id.clone(),
                count: many.len(),
            }))
        }
    };

    match api.update_performer_image(&performer.id, &image_url).await? {
        Some(performer) => Ok(PerformerImageOutcome::Updated {
            performer,
            image_url,
        }),
        None => Ok(Skipped(SkipReason::UpdateReturnedNothing(
            performer.id.clone(),
        ))),
    }
}
