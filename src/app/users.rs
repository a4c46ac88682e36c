use anyhow::{Context, Result};
use serde_json::Value;

use crate::app::normalize::{id_string, normalize_posts_in};
use crate::app::posts::SavedPostService;
use crate::domain::post::Post;
use crate::domain::user::UserProfile;
use crate::http::routes;
use crate::infra::api::ApiClient;

#[derive(Clone)]
pub struct UserService {
    api: ApiClient,
}

/// Profile screen data: the user and their bookmarks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePage {
    pub profile: Option<UserProfile>,
    pub saved: Vec<Post>,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /me`; `None` when signed out.
    pub async fn load_profile(&self) -> Result<Option<UserProfile>> {
        let payload = self
            .api
            .get_authed(&routes::me())
            .await
            .context("failed to load profile")?;
        Ok(payload.map(|payload| profile_from(&payload)))
    }

    /// Profile and saved posts fetched side by side. A failing saved list
    /// leaves the profile usable.
    pub async fn load_profile_page(&self) -> Result<ProfilePage> {
        let saved_service = SavedPostService::new(self.api.clone());
        let (profile, saved) = futures::join!(self.load_profile(), saved_service.saved_posts());

        let saved = saved.unwrap_or_else(|err| {
            tracing::error!(error = ?err, "failed to load saved posts");
            Vec::new()
        });

        Ok(ProfilePage {
            profile: profile?,
            saved,
        })
    }
}

fn profile_from(payload: &Value) -> UserProfile {
    let text = |key: &str| {
        payload
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    UserProfile {
        id: payload.get("id").and_then(id_string),
        username: text("username"),
        email: text("email"),
        posts: normalize_posts_in(payload, "posts"),
    }
}
