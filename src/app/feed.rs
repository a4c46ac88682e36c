use anyhow::{Context, Result};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::app::engagement::{VoteController, VoteFailurePolicy, VoteOutcome};
use crate::app::geo::map_markers;
use crate::app::normalize::normalize_posts;
use crate::app::store::PostStore;
use crate::app::view::{FeedView, SortMode};
use crate::domain::post::{MapMarker, Post, Vote};
use crate::http::routes;
use crate::infra::api::ApiClient;
use crate::AppState;

#[derive(Clone)]
pub struct FeedService {
    api: ApiClient,
}

impl FeedService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Normalized `GET /posts`. `None` when signed out.
    pub async fn fetch_posts(&self) -> Result<Option<Vec<Post>>> {
        let payload = self
            .api
            .get_authed(&routes::posts())
            .await
            .context("failed to load posts")?;
        Ok(payload.map(|payload| normalize_posts(&payload)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenStatus {
    Loading,
    Loaded,
    Error(String),
}

/// Everything one mounted feed screen shows.
#[derive(Debug)]
pub struct ScreenState {
    pub store: PostStore,
    pub status: ScreenStatus,
    pub refreshing: bool,
    pub view: FeedView,
}

impl ScreenState {
    fn new(sort: SortMode) -> Self {
        Self {
            store: PostStore::new(),
            status: ScreenStatus::Loading,
            refreshing: false,
            view: FeedView::new(sort),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncOutcome {
    Replaced(usize),
    Unmounted,
}

/// Replaces the screen's posts with a fresh fetch. Safe to call from any
/// failure path and repeatedly; a screen dropped mid-request is left alone.
pub async fn resynchronize(
    feed: &FeedService,
    screen: &Weak<RwLock<ScreenState>>,
) -> Result<ResyncOutcome> {
    let posts = feed.fetch_posts().await?.unwrap_or_default();

    let Some(screen) = screen.upgrade() else {
        debug!("feed screen unmounted before resync finished");
        return Ok(ResyncOutcome::Unmounted);
    };

    let count = posts.len();
    screen.write().await.store.replace(posts);
    Ok(ResyncOutcome::Replaced(count))
}

/// A mounted feed screen.
///
/// Clones share the same state. Background work holds only weak handles, so
/// dropping every clone unmounts the screen.
#[derive(Clone)]
pub struct FeedScreen {
    feed: FeedService,
    votes: VoteController,
    state: Arc<RwLock<ScreenState>>,
}

impl FeedScreen {
    pub fn mount(app: &AppState) -> Self {
        Self::new(app.api.clone(), app.vote_failure_policy, app.default_sort)
    }

    pub fn new(api: ApiClient, policy: VoteFailurePolicy, sort: SortMode) -> Self {
        let feed = FeedService::new(api);
        Self {
            votes: VoteController::new(feed.clone(), policy),
            feed,
            state: Arc::new(RwLock::new(ScreenState::new(sort))),
        }
    }

    /// First load; the only fetch that shows the loading status.
    pub async fn load(&self) {
        self.state.write().await.status = ScreenStatus::Loading;
        let result = self.feed.fetch_posts().await;
        self.apply_fetch(result).await;
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) {
        self.state.write().await.refreshing = true;
        let result = self.feed.fetch_posts().await;
        self.apply_fetch(result).await;
    }

    /// Background resynchronization. Failures keep the current display.
    pub async fn resync(&self) -> Result<ResyncOutcome> {
        let outcome = resynchronize(&self.feed, &Arc::downgrade(&self.state)).await;
        if let Err(err) = &outcome {
            warn!(error = ?err, "feed resync failed");
        }
        outcome
    }

    /// Optimistic vote. The returned handle resolves once the server has
    /// answered and any reconciliation is done; dropping it does not cancel.
    pub async fn vote(&self, post_id: i64, next: Vote) -> JoinHandle<VoteOutcome> {
        self.votes.vote(&self.state, post_id, next).await
    }

    async fn apply_fetch(&self, result: Result<Option<Vec<Post>>>) {
        let mut state = self.state.write().await;
        state.refreshing = false;
        match result {
            Ok(Some(posts)) => {
                state.store.replace(posts);
                state.status = ScreenStatus::Loaded;
            }
            Ok(None) => {
                debug!("no access token, showing empty feed");
                state.store.clear();
                state.status = ScreenStatus::Loaded;
            }
            Err(err) => {
                error!(error = ?err, "failed to load feed");
                state.store.clear();
                state.status = ScreenStatus::Error(format!("{:#}", err));
            }
        }
    }

    pub async fn status(&self) -> ScreenStatus {
        self.state.read().await.status.clone()
    }

    pub async fn is_refreshing(&self) -> bool {
        self.state.read().await.refreshing
    }

    /// Posts in display order after sort and tag filter.
    pub async fn visible(&self) -> Vec<Post> {
        let state = self.state.read().await;
        state.view.project(state.store.posts())
    }

    /// Every loaded post in fetched order.
    pub async fn posts(&self) -> Vec<Post> {
        self.state.read().await.store.posts().to_vec()
    }

    pub async fn post(&self, post_id: i64) -> Option<Post> {
        self.state.read().await.store.get(post_id).cloned()
    }

    pub async fn markers(&self) -> Vec<MapMarker> {
        map_markers(self.state.read().await.store.posts())
    }

    pub async fn set_sort(&self, sort: SortMode) {
        self.state.write().await.view.sort = sort;
    }

    pub async fn toggle_tag(&self, tag: &str) {
        self.state.write().await.view.toggle_tag(tag);
    }

    pub async fn set_tags<I, S>(&self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.write().await.view.tags = tags.into_iter().map(Into::into).collect();
    }
}
