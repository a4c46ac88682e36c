use std::collections::HashMap;

use crate::domain::post::{Post, Vote};

/// Pre-mutation vote state of one post, kept so a failed confirmation can be
/// undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteSnapshot {
    pub post_id: i64,
    pub score: i64,
    pub user_vote: Vote,
    /// Store generation of the optimistic update this snapshot belongs to.
    pub generation: u64,
}

/// Ordered posts for one screen.
#[derive(Debug, Clone, Default)]
pub struct PostStore {
    posts: Vec<Post>,
    /// Bumped by every vote and every replace.
    generation: u64,
    /// Generation of the latest local vote per post since the last replace.
    last_vote: HashMap<i64, u64>,
}

impl PostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn get(&self, post_id: i64) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == post_id)
    }

    /// Swaps in a fully normalized collection. Snapshots taken before the
    /// swap no longer restore.
    pub fn replace(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.generation += 1;
        self.last_vote.clear();
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Moves the viewer's vote on `post_id` to `next`, shifting the score by
    /// the signed difference. Unknown ids are a no-op returning `None`.
    pub fn apply_vote(&mut self, post_id: i64, next: Vote) -> Option<VoteSnapshot> {
        let post = self.posts.iter_mut().find(|post| post.id == post_id)?;
        self.generation += 1;
        let snapshot = VoteSnapshot {
            post_id,
            score: post.score,
            user_vote: post.user_vote,
            generation: self.generation,
        };
        post.score += post.user_vote.delta_to(next);
        post.user_vote = next;
        self.last_vote.insert(post_id, self.generation);
        Some(snapshot)
    }

    /// Undoes an optimistic vote. Skipped unless that vote is still the
    /// latest change to the post: a later vote on it or a replace since then
    /// wins.
    pub fn restore(&mut self, snapshot: &VoteSnapshot) -> bool {
        if self.last_vote.get(&snapshot.post_id) != Some(&snapshot.generation) {
            return false;
        }
        let Some(post) = self.posts.iter_mut().find(|post| post.id == snapshot.post_id) else {
            return false;
        };
        post.score = snapshot.score;
        post.user_vote = snapshot.user_vote;
        self.last_vote.remove(&snapshot.post_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, score: i64, user_vote: Vote) -> Post {
        Post {
            id,
            title: format!("spot {id}"),
            description: String::new(),
            image_url: None,
            latitude: Some(1.0),
            longitude: Some(2.0),
            author_username: Some("lee".into()),
            author_id: Some("5".into()),
            created_at: "2024-01-01T00:00:00Z".into(),
            score,
            user_vote,
            tags: vec!["food".into()],
        }
    }

    #[test]
    fn vote_deltas_accumulate() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);

        store.apply_vote(1, Vote::Up).unwrap();
        assert_eq!(store.get(1).unwrap().score, 11);
        assert_eq!(store.get(1).unwrap().user_vote, Vote::Up);

        store.apply_vote(1, Vote::Down).unwrap();
        assert_eq!(store.get(1).unwrap().score, 9);
        assert_eq!(store.get(1).unwrap().user_vote, Vote::Down);

        store.apply_vote(1, Vote::None).unwrap();
        assert_eq!(store.get(1).unwrap().score, 10);
    }

    #[test]
    fn vote_leaves_other_fields_alone() {
        let mut store = PostStore::new();
        let original = post(1, 3, Vote::None);
        store.replace(vec![original.clone(), post(2, 0, Vote::None)]);

        store.apply_vote(1, Vote::Up);

        let updated = store.get(1).unwrap();
        assert_eq!(
            Post {
                score: original.score,
                user_vote: original.user_vote,
                ..updated.clone()
            },
            original
        );
        assert_eq!(store.get(2).unwrap().score, 0);
    }

    #[test]
    fn unknown_post_is_noop() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);

        assert!(store.apply_vote(99, Vote::Up).is_none());
        assert_eq!(store.get(1).unwrap().score, 10);
    }

    #[test]
    fn same_vote_twice_changes_nothing() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::Up)]);

        store.apply_vote(1, Vote::Up);
        assert_eq!(store.get(1).unwrap().score, 10);
    }

    #[test]
    fn restore_returns_to_snapshot() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);

        let snapshot = store.apply_vote(1, Vote::Up).unwrap();
        assert_eq!(store.get(1).unwrap().score, 11);

        assert!(store.restore(&snapshot));
        assert_eq!(store.get(1).unwrap().score, 10);
        assert_eq!(store.get(1).unwrap().user_vote, Vote::None);
    }

    #[test]
    fn restore_skips_newer_vote() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);

        let first = store.apply_vote(1, Vote::Up).unwrap();
        store.apply_vote(1, Vote::Down).unwrap();

        assert!(!store.restore(&first));
        assert_eq!(store.get(1).unwrap().score, 9);
        assert_eq!(store.get(1).unwrap().user_vote, Vote::Down);
    }

    #[test]
    fn restore_skips_newer_tap_back_to_same_vote() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);

        let first = store.apply_vote(1, Vote::Up).unwrap();
        store.apply_vote(1, Vote::None).unwrap();
        store.apply_vote(1, Vote::Up).unwrap();

        assert!(!store.restore(&first));
        assert_eq!(store.get(1).unwrap().score, 11);
        assert_eq!(store.get(1).unwrap().user_vote, Vote::Up);
    }

    #[test]
    fn restore_skips_after_fresh_fetch() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);
        let snapshot = store.apply_vote(1, Vote::Up).unwrap();

        // The server already counted the vote.
        store.replace(vec![post(1, 11, Vote::Up)]);

        assert!(!store.restore(&snapshot));
        assert_eq!(store.get(1).unwrap().score, 11);
        assert_eq!(store.get(1).unwrap().user_vote, Vote::Up);
    }

    #[test]
    fn restore_applies_once() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);
        let snapshot = store.apply_vote(1, Vote::Down).unwrap();

        assert!(store.restore(&snapshot));
        assert!(!store.restore(&snapshot));
        assert_eq!(store.get(1).unwrap().score, 10);
    }

    #[test]
    fn restore_after_replace_without_post() {
        let mut store = PostStore::new();
        store.replace(vec![post(1, 10, Vote::None)]);
        let snapshot = store.apply_vote(1, Vote::Up).unwrap();

        store.replace(vec![post(2, 0, Vote::None)]);
        assert!(!store.restore(&snapshot));
        assert_eq!(store.len(), 1);
    }
}
