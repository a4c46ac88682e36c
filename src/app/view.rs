use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::post::Post;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Recent,
    Top,
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(Self::Recent),
            "top" => Ok(Self::Top),
            other => Err(format!("unknown sort mode: {}", other)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recent => f.write_str("recent"),
            Self::Top => f.write_str("top"),
        }
    }
}

/// Sort mode plus tag filter for a feed list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedView {
    pub sort: SortMode,
    pub tags: BTreeSet<String>,
}

impl FeedView {
    pub fn new(sort: SortMode) -> Self {
        Self {
            sort,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Flips a tag in or out of the filter set.
    pub fn toggle_tag(&mut self, tag: &str) {
        if !self.tags.remove(tag) {
            self.tags.insert(tag.to_string());
        }
    }

    /// Filtered, display-ordered copy of `posts`.
    pub fn project(&self, posts: &[Post]) -> Vec<Post> {
        let mut keyed: Vec<(i64, &Post)> = posts
            .iter()
            .filter(|post| self.tags.is_empty() || post.has_any_tag(&self.tags))
            .map(|post| (timestamp_millis(&post.created_at), post))
            .collect();

        // `sort_by` is stable, so equal keys keep their fetched order.
        match self.sort {
            SortMode::Recent => keyed.sort_by(|a, b| b.0.cmp(&a.0)),
            SortMode::Top => keyed.sort_by(|a, b| b.1.score.cmp(&a.1.score).then(b.0.cmp(&a.0))),
        }

        keyed.into_iter().map(|(_, post)| post.clone()).collect()
    }
}

/// Rewrites server timestamps into RFC 3339: `T` separator, at most
/// millisecond precision, UTC when no offset is given.
pub fn normalize_timestamp(raw: &str) -> String {
    let mut value = raw.trim().to_string();

    if !value.contains('T') {
        if let Some(space) = value.find(' ') {
            value.replace_range(space..space + 1, "T");
        }
    }

    value = truncate_fraction(&value);

    if !has_zone(&value) {
        value.push('Z');
    }
    value
}

/// Milliseconds since the epoch; anything unparseable sorts as 0.
pub fn timestamp_millis(raw: &str) -> i64 {
    let normalized = normalize_timestamp(raw);
    match OffsetDateTime::parse(&normalized, &Rfc3339) {
        Ok(parsed) => (parsed.unix_timestamp_nanos() / 1_000_000) as i64,
        Err(_) => 0,
    }
}

/// Keeps the first three digits after the first `.digit` run.
fn truncate_fraction(value: &str) -> String {
    let bytes = value.as_bytes();
    let Some(dot) = bytes
        .windows(2)
        .position(|pair| pair[0] == b'.' && pair[1].is_ascii_digit())
    else {
        return value.to_string();
    };

    let digits_start = dot + 1;
    let digits_end = bytes[digits_start..]
        .iter()
        .position(|byte| !byte.is_ascii_digit())
        .map_or(bytes.len(), |offset| digits_start + offset);

    if digits_end - digits_start <= 3 {
        return value.to_string();
    }

    let mut truncated = String::with_capacity(value.len());
    truncated.push_str(&value[..digits_start + 3]);
    truncated.push_str(&value[digits_end..]);
    truncated
}

/// `Z` or a trailing `+HH:MM` / `-HH:MM`.
fn has_zone(value: &str) -> bool {
    if value.ends_with('Z') {
        return true;
    }
    let bytes = value.as_bytes();
    if bytes.len() < 6 {
        return false;
    }
    let tail = &bytes[bytes.len() - 6..];
    matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}
