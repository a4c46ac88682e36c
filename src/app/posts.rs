use anyhow::{Context, Result};
use serde_json::Value;

use crate::app::normalize::normalize_posts_in;
use crate::domain::post::Post;
use crate::http::{routes, ApiError};
use crate::infra::api::ApiClient;

/// Server message for a save that left the post saved.
pub const POST_SAVED: &str = "Post saved";

/// Saved-post bookmarks.
#[derive(Clone)]
pub struct SavedPostService {
    api: ApiClient,
}

impl SavedPostService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /me/saved`; empty when signed out.
    pub async fn saved_posts(&self) -> Result<Vec<Post>> {
        let payload = self
            .api
            .get_authed(&routes::saved())
            .await
            .context("failed to load saved posts")?;
        Ok(payload
            .map(|payload| normalize_posts_in(&payload, "saved_posts"))
            .unwrap_or_default())
    }

    pub async fn is_saved(&self, post_id: i64) -> Result<bool> {
        let saved = self.saved_posts().await?;
        Ok(saved.iter().any(|post| post.id == post_id))
    }

    /// Toggles the bookmark; returns whether the post is now saved.
    pub async fn toggle_save(&self, post_id: i64) -> Result<bool> {
        let response = self
            .api
            .post_authed_empty(&routes::save(post_id))
            .await
            .context("failed to save post")?
            .ok_or_else(ApiError::missing_credential)?;

        let saved = response.get("message").and_then(Value::as_str) == Some(POST_SAVED);
        tracing::debug!(post_id, saved, "save toggled");
        Ok(saved)
    }
}
