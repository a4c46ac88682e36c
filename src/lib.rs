pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use anyhow::Result;
use std::sync::Arc;

use crate::app::engagement::VoteFailurePolicy;
use crate::app::view::SortMode;
use crate::config::AppConfig;
use crate::infra::{api::ApiClient, storage::Credentials, storage::FileTokenStore};

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub credentials: Credentials,
    pub vote_failure_policy: VoteFailurePolicy,
    pub default_sort: SortMode,
}

impl AppState {
    pub fn new(config: &AppConfig, credentials: Credentials) -> Result<Self> {
        let api = ApiClient::new(config, credentials.clone())?;
        Ok(Self {
            api,
            credentials,
            vote_failure_policy: config.vote_failure_policy,
            default_sort: config.default_sort,
        })
    }

    /// State backed by the token file named in the config.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = FileTokenStore::new(config.token_path.clone());
        Self::new(config, Credentials::new(Arc::new(store)))
    }
}
