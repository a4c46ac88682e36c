use serde::Serialize;

use crate::domain::post::Post;

/// The signed-in user as returned by `GET /me`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: Option<String>,
    pub username: String,
    pub email: String,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionState {
    SignedIn,
    SignedOut,
}
