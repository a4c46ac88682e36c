use anyhow::{anyhow, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::feed::{resynchronize, FeedService, ResyncOutcome, ScreenState};
use crate::app::store::VoteSnapshot;
use crate::domain::post::Vote;
use crate::http::routes;

/// What to do when the server does not confirm a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoteFailurePolicy {
    /// Refetch the whole feed; roll back locally if that fetch fails too.
    #[default]
    Resync,
    /// Restore only the voted post.
    Rollback,
}

impl FromStr for VoteFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "resync" => Ok(Self::Resync),
            "rollback" => Ok(Self::Rollback),
            other => Err(format!("unknown vote failure policy: {}", other)),
        }
    }
}

impl fmt::Display for VoteFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resync => f.write_str("resync"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Confirmed,
    Resynced,
    RolledBack,
    /// The screen was gone by the time reconciliation ran.
    Unmounted,
}

#[derive(Serialize)]
struct VoteRequest {
    value: i64,
}

/// Applies votes locally first, then confirms them with the server.
///
/// Votes on the same post are not serialized: two quick taps send two
/// requests whose answers may arrive in either order. A later fetch is the
/// backstop.
#[derive(Clone)]
pub struct VoteController {
    feed: FeedService,
    policy: VoteFailurePolicy,
}

impl VoteController {
    pub fn new(feed: FeedService, policy: VoteFailurePolicy) -> Self {
        Self { feed, policy }
    }

    pub async fn vote(
        &self,
        screen: &Arc<RwLock<ScreenState>>,
        post_id: i64,
        next: Vote,
    ) -> JoinHandle<VoteOutcome> {
        let snapshot = screen.write().await.store.apply_vote(post_id, next);
        if snapshot.is_none() {
            debug!(post_id, "vote for post not on screen");
        }

        let controller = self.clone();
        let screen = Arc::downgrade(screen);
        tokio::spawn(async move { controller.confirm(screen, post_id, next, snapshot).await })
    }

    async fn confirm(
        &self,
        screen: Weak<RwLock<ScreenState>>,
        post_id: i64,
        next: Vote,
        snapshot: Option<VoteSnapshot>,
    ) -> VoteOutcome {
        match self.send_vote(post_id, next).await {
            Ok(()) => {
                debug!(post_id, vote = next.value(), "vote confirmed");
                VoteOutcome::Confirmed
            }
            Err(err) => {
                warn!(post_id, vote = next.value(), error = ?err, "vote not confirmed");
                self.reconcile(&screen, snapshot).await
            }
        }
    }

    async fn send_vote(&self, post_id: i64, next: Vote) -> Result<()> {
        let body = VoteRequest {
            value: next.value(),
        };
        self.feed
            .api()
            .post_authed(&routes::vote(post_id), &body)
            .await?
            .ok_or_else(|| anyhow!("not signed in"))?;
        Ok(())
    }

    async fn reconcile(
        &self,
        screen: &Weak<RwLock<ScreenState>>,
        snapshot: Option<VoteSnapshot>,
    ) -> VoteOutcome {
        if self.policy == VoteFailurePolicy::Resync {
            match resynchronize(&self.feed, screen).await {
                Ok(ResyncOutcome::Replaced(count)) => {
                    debug!(count, "feed resynced after failed vote");
                    return VoteOutcome::Resynced;
                }
                Ok(ResyncOutcome::Unmounted) => return VoteOutcome::Unmounted,
                Err(err) => {
                    warn!(error = ?err, "resync after failed vote failed, rolling back");
                }
            }
        }
        rollback(screen, snapshot).await
    }
}

async fn rollback(screen: &Weak<RwLock<ScreenState>>, snapshot: Option<VoteSnapshot>) -> VoteOutcome {
    let Some(screen) = screen.upgrade() else {
        debug!("feed screen unmounted before rollback");
        return VoteOutcome::Unmounted;
    };
    if let Some(snapshot) = snapshot {
        if !screen.write().await.store.restore(&snapshot) {
            debug!(post_id = snapshot.post_id, "post changed since vote, leaving it as is");
        }
    }
    VoteOutcome::RolledBack
}
