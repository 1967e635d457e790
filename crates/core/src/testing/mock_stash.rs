//! Mock Stash API for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::stash::{StashApi, StashError, StashImage, StashPerformer};

/// Mock implementation of the StashApi trait.
///
/// Holds images by id and records every performer update as
/// `(performer_id, image_url)`.
#[derive(Debug, Default)]
pub struct MockStash {
    images: Arc<RwLock<HashMap<String, StashImage>>>,
    updates: Arc<RwLock<Vec<(String, String)>>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<StashError>>>,
    update_returns_nothing: Arc<RwLock<bool>>,
}

impl MockStash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_image(&self, image: StashImage) {
        self.images.write().unwrap().insert(image.id.clone(), image);
    }

    /// Configure the next call to fail with the given error.
    pub fn set_next_error(&self, error: StashError) {
        *self.next_error.write().unwrap() = Some(error);
    }

    /// Make `update_performer_image` answer with no performer.
    pub fn set_update_returns_nothing(&self, value: bool) {
        *self.update_returns_nothing.write().unwrap() = value;
    }

    pub fn recorded_updates(&self) -> Vec<(String, String)> {
        self.updates.read().unwrap().clone()
    }

    fn take_error(&self) -> Result<(), StashError> {
        match self.next_error.write().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StashApi for MockStash {
    async fn find_image(&self, id: &str) -> Result<Option<StashImage>, StashError> {
        self.take_error()?;
        Ok(self.images.read().unwrap().get(id).cloned())
    }

    async fn update_performer_image(
        &self,
        performer_id: &str,
        image_url: &str,
    ) -> Result<Option<StashPerformer>, StashError> {
        self.take_error()?;
        self.updates
            .write()
            .unwrap()
            .push((performer_id.to_string(), image_url.to_string()));

        if *self.update_returns_nothing.read().unwrap() {
            return Ok(None);
        }

        let performer = self
            .images
            .read()
            .unwrap()
            .values()
            .flat_map(|image| image.performers.iter())
            .find(|p| p.id == performer_id)
            .cloned()
            .unwrap_or_else(|| StashPerformer {
                id: performer_id.to_string(),
                name: String::new(),
                image_path: None,
            });

        Ok(Some(StashPerformer {
            image_path: Some(image_url.to_string()),
            ..performer
        }))
    }
}
