//! Stash GraphQL client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{StashApi, StashError, StashImage, StashPerformer};
use crate::config::{HttpConfig, StashConfig};

const FIND_IMAGE_QUERY: &str = r#"
query FindImage($id: ID!) {
  findImage(id: $id) {
    id
    title
    paths { image }
    performers { id name image_path }
  }
}"#;

const PERFORMER_UPDATE_MUTATION: &str = r#"
mutation PerformerUpdate($input: PerformerUpdateInput!) {
  performerUpdate(input: $input) {
    id
    name
    image_path
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FindImageData {
    #[serde(rename = "findImage")]
    find_image: Option<StashImage>,
}

#[derive(Debug, Deserialize)]
struct PerformerUpdateData {
    #[serde(rename = "performerUpdate")]
    performer_update: Option<StashPerformer>,
}

/// Stash GraphQL client.
pub struct StashClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl StashClient {
    pub fn new(stash: &StashConfig, http: &HttpConfig) -> Result<Self, StashError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(u64::from(http.timeout_secs)))
            .user_agent(http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            url: stash.url.clone(),
            api_key: stash.api_key.clone().filter(|k| !k.is_empty()),
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<Option<T>, StashError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&json!({ "query": query, "variables": variables }));

        if let Some(key) = &self.api_key {
            request = request.header("ApiKey", key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StashError::Http(format!("status {}: {}", status.as_u16(), body)));
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| StashError::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

        if !body.errors.is_empty() {
            return Err(StashError::GraphQl(
                body.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        Ok(body.data)
    }
}

#[async_trait]
impl StashApi for StashClient {
    async fn find_image(&self, id: &str) -> Result<Option<StashImage>, StashError> {
        debug!(image_id = id, "Stash findImage");
        let data: Option<FindImageData> = self
            .execute(FIND_IMAGE_QUERY, json!({ "id": id }))
            .await?;
        Ok(data.and_then(|d| d.find_image))
    }

    async fn update_performer_image(
        &self,
        performer_id: &str,
        image_url: &str,
    ) -> Result<Option<StashPerformer>, StashError> {
        debug!(performer_id, image_url, "Stash performerUpdate");
        let data: Option<PerformerUpdateData> = self
            .execute(
                PERFORMER_UPDATE_MUTATION,
                json!({ "input": { "id": performer_id, "image": image_url } }),
            )
            .await?;
        Ok(data.and_then(|d| d.performer_update))
    }
}
