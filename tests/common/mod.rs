#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use iknowaspot::app::engagement::VoteFailurePolicy;
use iknowaspot::app::feed::FeedScreen;
use iknowaspot::app::view::SortMode;
use iknowaspot::config::{parse_api_url, AppConfig};
use iknowaspot::infra::storage::{Credentials, MemoryTokenStore};
use iknowaspot::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TEST_TOKEN: &str = "test-access-token";
pub const TEST_EMAIL: &str = "spotter@example.com";
pub const TEST_PASSWORD: &str = "correct horse";
pub const CDN: &str = "https://cdn.example.com";

// ---------------------------------------------------------------------------
// Mock spot API state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockApi {
    pub base_url: String,
    /// Authoritative `GET /posts` payload.
    pub posts: Value,
    /// One-shot `(delay, payload)` answers served before `posts`.
    pub scripted_posts: VecDeque<(Duration, Value)>,
    pub posts_failure: Option<(StatusCode, Value)>,
    pub posts_requests: usize,
    pub vote_failure: Option<StatusCode>,
    pub vote_delay: Duration,
    pub votes: Vec<(i64, Value)>,
    pub saved: BTreeSet<i64>,
    pub friends: Vec<Value>,
    pub registered: Vec<Value>,
    pub presign_requests: Vec<Value>,
    pub presign_without_upload_url: bool,
    pub uploads: Vec<(String, String, usize)>,
    pub created: Vec<Value>,
}

type Shared = Arc<Mutex<MockApi>>;

pub struct TestServer {
    pub base_url: String,
    state: Shared,
}

/// Spawns a mock spot API on a random local port for the current test runtime.
pub async fn spawn_server() -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock api");
    let addr = listener.local_addr().expect("failed to read mock addr");
    let base_url = format!("http://{}", addr);

    let state: Shared = Arc::new(Mutex::new(MockApi {
        base_url: base_url.clone(),
        posts: sample_posts(),
        friends: vec![json!({ "id": 2, "username": "dana", "email": "dana@example.com" })],
        ..MockApi::default()
    }));

    let router = Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/:id/vote", post(vote_post))
        .route("/posts/:id/save", post(toggle_save))
        .route("/me", get(me))
        .route("/me/saved", get(saved_posts))
        .route("/me/friends", get(list_friends))
        .route("/friends/add/:user_id", post(add_friend))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/presign", post(presign))
        .route("/upload/:name", put(upload))
        .route("/create-post", post(create_post))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock api crashed");
    });

    TestServer { base_url, state }
}

impl TestServer {
    pub fn mock(&self) -> MutexGuard<'_, MockApi> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn config(&self, policy: VoteFailurePolicy) -> AppConfig {
        AppConfig {
            api_url: parse_api_url(&self.base_url).expect("mock url"),
            token_path: PathBuf::from("unused"),
            http_timeout_seconds: 5,
            vote_failure_policy: policy,
            default_sort: SortMode::Recent,
        }
    }

    /// App state holding `token` in an in-memory token store.
    pub fn app(&self, token: Option<&str>, policy: VoteFailurePolicy) -> AppState {
        let store = match token {
            Some(token) => MemoryTokenStore::with_token(token),
            None => MemoryTokenStore::new(),
        };
        let credentials = Credentials::new(Arc::new(store));
        AppState::new(&self.config(policy), credentials).expect("failed to build AppState")
    }

    pub fn signed_in(&self) -> AppState {
        self.app(Some(TEST_TOKEN), VoteFailurePolicy::Resync)
    }

    pub async fn loaded_screen(&self, policy: VoteFailurePolicy) -> FeedScreen {
        let screen = FeedScreen::mount(&self.app(Some(TEST_TOKEN), policy));
        screen.load().await;
        screen
    }
}

/// Three well-formed spots plus one the normalizer must drop.
pub fn sample_posts() -> Value {
    json!({ "posts": [
        {
            "id": 1,
            "title": "Taco truck",
            "description": "Best al pastor downtown",
            "s3_url": format!("{}/1.jpg", CDN),
            "latitude": 40.7128,
            "longitude": -74.006,
            "username": "maya",
            "user_id": 7,
            "created_at": "2024-01-01 10:00:00",
            "score": 10,
            "user_vote": 0,
            "tags": ["food"]
        },
        {
            "id": 2,
            "title": "Overlook",
            "description": "",
            "s3_url": format!("{}/2.jpg", CDN),
            "latitude": 40.75,
            "longitude": -73.98,
            "username": "dana",
            "user_id": 2,
            "created_at": "2024-01-02T10:00:00Z",
            "score": 5,
            "user_vote": 1,
            "tags": ["scenic", "nature"]
        },
        {
            "id": 3,
            "title": "Mystery bench",
            "latitude": null,
            "longitude": "n/a",
            "created_at": "not-a-date",
            "score": 5,
            "tags": []
        },
        { "title": "no id at all" }
    ]})
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(format!("Bearer {}", TEST_TOKEN).as_str())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Invalid token" })),
    )
        .into_response()
}

fn post_records(posts: &Value) -> Vec<Value> {
    match posts {
        Value::Array(records) => records.clone(),
        other => other
            .get("posts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

async fn list_posts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let (delay, payload) = {
        let mut mock = state.lock().unwrap();
        mock.posts_requests += 1;
        if let Some((status, body)) = mock.posts_failure.clone() {
            return (status, Json(body)).into_response();
        }
        match mock.scripted_posts.pop_front() {
            Some(scripted) => scripted,
            None => (Duration::ZERO, mock.posts.clone()),
        }
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    Json(payload).into_response()
}

async fn vote_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }

    let (delay, failure) = {
        let mut mock = state.lock().unwrap();
        mock.votes.push((id, body.clone()));
        (mock.vote_delay, mock.vote_failure)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = failure {
        return (status, Json(json!({ "detail": "vote rejected" }))).into_response();
    }

    let value = body["value"].as_i64().unwrap_or(0);
    let mut mock = state.lock().unwrap();
    let records = match &mut mock.posts {
        Value::Array(records) => records,
        Value::Object(map) => match map.get_mut("posts").and_then(Value::as_array_mut) {
            Some(records) => records,
            None => return StatusCode::NOT_FOUND.into_response(),
        },
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let Some(post) = records.iter_mut().find(|post| post["id"] == json!(id)) else {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Post not found" }))).into_response();
    };

    let previous = post["user_vote"].as_i64().unwrap_or(0);
    let score = post["score"].as_i64().unwrap_or(0) + value - previous;
    post["score"] = json!(score);
    post["user_vote"] = json!(value);
    StatusCode::NO_CONTENT.into_response()
}

async fn toggle_save(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut mock = state.lock().unwrap();
    let message = if mock.saved.remove(&id) {
        "Post unsaved"
    } else {
        mock.saved.insert(id);
        "Post saved"
    };
    Json(json!({ "message": message })).into_response()
}

async fn saved_posts(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mock = state.lock().unwrap();
    let saved: Vec<Value> = post_records(&mock.posts)
        .into_iter()
        .filter(|post| {
            post["id"]
                .as_i64()
                .map_or(false, |id| mock.saved.contains(&id))
        })
        .collect();
    Json(json!({ "saved_posts": saved })).into_response()
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mock = state.lock().unwrap();
    let own: Vec<Value> = post_records(&mock.posts)
        .into_iter()
        .filter(|post| post["username"] == json!("maya"))
        .collect();
    Json(json!({
        "id": 7,
        "username": "maya",
        "email": TEST_EMAIL,
        "posts": own
    }))
    .into_response()
}

async fn list_friends(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mock = state.lock().unwrap();
    Json(json!({ "friends": mock.friends })).into_response()
}

async fn add_friend(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut mock = state.lock().unwrap();
    let exists = mock
        .friends
        .iter()
        .any(|friend| friend["id"].to_string().trim_matches('"') == user_id);
    if exists {
        return Json(json!({ "status": "exists", "message": "Already friends" })).into_response();
    }
    mock.friends.push(json!({ "id": user_id, "username": format!("user{}", user_id) }));
    Json(json!({ "status": "created", "message": "Friend added" })).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mock = state.lock().unwrap();
    let matches_default = body["email"] == json!(TEST_EMAIL) && body["password"] == json!(TEST_PASSWORD);
    let matches_registered = mock
        .registered
        .iter()
        .any(|user| user["email"] == body["email"] && user["password"] == body["password"]);

    if matches_default || matches_registered {
        Json(json!({ "access_token": TEST_TOKEN, "token_type": "bearer" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid credentials" })),
        )
            .into_response()
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut mock = state.lock().unwrap();
    let taken = body["email"] == json!(TEST_EMAIL)
        || mock.registered.iter().any(|user| user["email"] == body["email"]);
    if taken {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Email already registered" })),
        )
            .into_response();
    }
    mock.registered.push(body);
    (StatusCode::CREATED, Json(json!({ "message": "User created" }))).into_response()
}

async fn presign(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut mock = state.lock().unwrap();
    mock.presign_requests.push(body.clone());
    let name = body["fileName"].as_str().unwrap_or("photo.jpg").to_string();
    let file_url = format!("{}/{}", CDN, name);
    if mock.presign_without_upload_url {
        return Json(json!({ "fileUrl": file_url })).into_response();
    }
    Json(json!({
        "uploadUrl": format!("{}/upload/{}", mock.base_url, name),
        "fileUrl": file_url
    }))
    .into_response()
}

async fn upload(
    State(state): State<Shared>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state
        .lock()
        .unwrap()
        .uploads
        .push((name, content_type, body.len()));
    StatusCode::OK.into_response()
}

async fn create_post(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.lock().unwrap().created.push(body);
    (StatusCode::CREATED, Json(json!({ "id": 99, "message": "Post created" }))).into_response()
}
