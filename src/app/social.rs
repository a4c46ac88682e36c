use anyhow::{Context, Result};
use serde_json::Value;

use crate::app::normalize::{collection, id_string};
use crate::domain::social_graph::{Friend, FriendRequestOutcome, FriendStatus};
use crate::http::{routes, ApiError};
use crate::infra::api::ApiClient;

#[derive(Clone)]
pub struct SocialService {
    api: ApiClient,
}

impl SocialService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /me/friends`; empty when signed out.
    pub async fn friends(&self) -> Result<Vec<Friend>> {
        let payload = self
            .api
            .get_authed(&routes::friends())
            .await
            .context("failed to load friends")?;
        Ok(payload.map(|payload| normalize_friends(&payload)).unwrap_or_default())
    }

    pub async fn is_friend(&self, user_id: &str) -> Result<bool> {
        let user_id = user_id.trim();
        let friends = self.friends().await?;
        Ok(friends.iter().any(|friend| friend.id == user_id))
    }

    pub async fn add_friend(&self, user_id: &str) -> Result<FriendRequestOutcome> {
        let response = self
            .api
            .post_authed_empty(&routes::add_friend(user_id.trim()))
            .await
            .context("failed to add friend")?
            .ok_or_else(ApiError::missing_credential)?;

        let status = response
            .get("status")
            .and_then(Value::as_str)
            .map(FriendStatus::from_wire)
            .unwrap_or_else(|| FriendStatus::Other(String::new()));
        let message = response
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);

        tracing::info!(user_id, status = ?status, "friend request sent");
        Ok(FriendRequestOutcome { status, message })
    }
}

/// Bare array or `{ "friends": [...] }`; records without an id are skipped.
pub fn normalize_friends(payload: &Value) -> Vec<Friend> {
    let Some(records) = collection(payload, &["friends"]) else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| {
            let id = record.get("id").and_then(id_string)?;
            Some(Friend {
                id,
                username: record
                    .get("username")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                email: record.get("email").and_then(Value::as_str).map(str::to_string),
            })
        })
        .collect()
}
