//! Endpoints of the spot API as path segments, joined onto the configured
//! base URL. Segments are percent-encoded when the URL is built.

pub type Route = Vec<String>;

fn route(segments: &[&str]) -> Route {
    segments.iter().map(|segment| segment.to_string()).collect()
}

pub fn posts() -> Route {
    route(&["posts"])
}

pub fn vote(post_id: i64) -> Route {
    vec!["posts".into(), post_id.to_string(), "vote".into()]
}

pub fn save(post_id: i64) -> Route {
    vec!["posts".into(), post_id.to_string(), "save".into()]
}

pub fn me() -> Route {
    route(&["me"])
}

pub fn saved() -> Route {
    route(&["me", "saved"])
}

pub fn friends() -> Route {
    route(&["me", "friends"])
}

pub fn add_friend(user_id: &str) -> Route {
    route(&["friends", "add", user_id])
}

pub fn presign() -> Route {
    route(&["presign"])
}

pub fn create_post() -> Route {
    route(&["create-post"])
}

pub fn login() -> Route {
    route(&["auth", "login"])
}

pub fn register() -> Route {
    route(&["auth", "register"])
}
