use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

use crate::app::engagement::VoteFailurePolicy;
use crate::app::view::SortMode;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: Url,
    pub token_path: PathBuf,
    pub http_timeout_seconds: u64,
    pub vote_failure_policy: VoteFailurePolicy,
    pub default_sort: SortMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_url = env_or_err("API_URL")?;
        let api_url = parse_api_url(&api_url)?;

        let token_path = match std::env::var("TOKEN_PATH") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_path(),
        };

        Ok(Self {
            api_url,
            token_path,
            http_timeout_seconds: env_or_parse("HTTP_TIMEOUT_SECONDS", "15")?,
            vote_failure_policy: env_or_parse("VOTE_FAILURE_POLICY", "resync")?,
            default_sort: env_or_parse("DEFAULT_SORT", "recent")?,
        })
    }
}

/// Parses the API base and forces a trailing slash so relative joins keep
/// any path prefix (`https://host/api` + `posts` -> `https://host/api/posts`).
pub fn parse_api_url(value: &str) -> Result<Url> {
    let mut url = Url::parse(value.trim()).map_err(|err| anyhow!("invalid API_URL: {}", err))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("invalid API_URL: {} cannot be a base", value));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_token_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".iknowaspot").join("access_token")
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
