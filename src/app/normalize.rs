//! Turns loosely-typed API payloads into [`Post`] entities.
//!
//! Nothing here fails: bad fields fall back to defaults and records without a
//! usable id are dropped.

use serde_json::{Map, Value};

use crate::domain::post::{Post, Vote};

/// Wrapper fields the API uses around post lists.
const COLLECTION_FIELDS: [&str; 2] = ["posts", "saved_posts"];

/// Outcome of validating one raw record.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated<T> {
    Accepted(T),
    Rejected(&'static str),
}

/// Normalizes `GET /posts` style payloads: a bare array, or an object with a
/// `posts` / `saved_posts` array. Anything else is an empty collection.
pub fn normalize_posts(payload: &Value) -> Vec<Post> {
    match collection(payload, &COLLECTION_FIELDS) {
        Some(records) => normalize_records(records),
        None => Vec::new(),
    }
}

/// Like [`normalize_posts`] but only looks at one named wrapper field.
pub fn normalize_posts_in(payload: &Value, field: &str) -> Vec<Post> {
    match collection(payload, &[field]) {
        Some(records) => normalize_records(records),
        None => Vec::new(),
    }
}

/// Array at the top level or under the first present wrapper field.
pub fn collection<'a>(payload: &'a Value, fields: &[&str]) -> Option<&'a Vec<Value>> {
    match payload {
        Value::Array(records) => Some(records),
        Value::Object(map) => fields
            .iter()
            .find_map(|field| map.get(*field))
            .and_then(Value::as_array),
        _ => None,
    }
}

fn normalize_records(records: &[Value]) -> Vec<Post> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match validate_post(record) {
            Validated::Accepted(post) => Some(post),
            Validated::Rejected(reason) => {
                tracing::debug!(index, reason, "dropping malformed post record");
                None
            }
        })
        .collect()
}

pub fn validate_post(record: &Value) -> Validated<Post> {
    let Value::Object(fields) = record else {
        return Validated::Rejected("record is not an object");
    };
    let Some(id) = fields.get("id").and_then(integer_id) else {
        return Validated::Rejected("id is missing or not a finite integer");
    };

    Validated::Accepted(Post {
        id,
        title: text(fields, "title"),
        description: text(fields, "description"),
        image_url: first_string(fields, &["image_url", "s3_url", "imageUrl"]),
        latitude: fields.get("latitude").and_then(finite_number),
        longitude: fields.get("longitude").and_then(finite_number),
        author_username: first_string(fields, &["username", "author_username"]),
        author_id: ["user_id", "author_id"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(id_string)),
        created_at: text(fields, "created_at"),
        score: fields.get("score").map(score).unwrap_or(0),
        user_vote: fields.get("user_vote").map(vote).unwrap_or_default(),
        tags: fields.get("tags").map(tags).unwrap_or_default(),
    })
}

/// Numbers and numeric strings that are finite and whole.
pub fn integer_id(value: &Value) -> Option<i64> {
    let raw = finite_number(value)?;
    if raw.fract() != 0.0 || raw < i64::MIN as f64 || raw >= i64::MAX as f64 {
        return None;
    }
    if let Some(exact) = value.as_i64() {
        return Some(exact);
    }
    Some(raw as i64)
}

/// JSON numbers or numeric strings, finite only.
pub fn finite_number(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    raw.is_finite().then_some(raw)
}

/// Identifiers kept as strings so they compare the same whatever the server sent.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => match number.as_i64() {
            Some(whole) => Some(whole.to_string()),
            None => number.as_f64().filter(|raw| raw.is_finite()).map(|raw| {
                if raw.fract() == 0.0 {
                    format!("{:.0}", raw)
                } else {
                    raw.to_string()
                }
            }),
        },
        _ => None,
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn first_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn score(value: &Value) -> i64 {
    if let Some(whole) = value.as_i64() {
        return whole;
    }
    match value.as_f64() {
        Some(raw) if raw.is_finite() => raw.trunc() as i64,
        _ => 0,
    }
}

fn vote(value: &Value) -> Vote {
    value.as_f64().map(Vote::from_sign).unwrap_or_default()
}

fn tags(value: &Value) -> Vec<String> {
    let Some(raw) = value.as_array() else {
        return Vec::new();
    };
    let mut tags: Vec<String> = Vec::with_capacity(raw.len());
    for label in raw.iter().filter_map(Value::as_str) {
        if !tags.iter().any(|seen| seen == label) {
            tags.push(label.to_string());
        }
    }
    tags
}
