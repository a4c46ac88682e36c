use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::user::SessionState;
use crate::http::{routes, ApiError};
use crate::infra::api::ApiClient;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Creates an account. The user still has to sign in afterwards.
    pub async fn register(&self, email: &str, username: &str, password: &str) -> Result<()> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || password.is_empty() {
            return Err(anyhow!("enter email and password"));
        }
        if username.is_empty() {
            return Err(anyhow!("enter a username"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(anyhow!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }

        let body = RegisterRequest {
            email,
            username,
            password,
        };
        self.api
            .post_public(&routes::register(), &body)
            .await
            .context("registration failed")?;
        info!(username, "account created");
        Ok(())
    }

    /// Signs in and stores the access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(anyhow!("enter email and password"));
        }

        let body = LoginRequest { email, password };
        let response = self
            .api
            .post_public(&routes::login(), &body)
            .await
            .context("sign in failed")?;

        let token = response
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::invalid_response("sign in response has no access_token"))?;

        self.api.credentials().save(token).await?;
        info!("signed in");
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.api.credentials().clear().await?;
        info!("signed out");
        Ok(())
    }

    /// Startup check: a stored token only counts if `GET /me` accepts it.
    /// Any failure clears the token.
    pub async fn restore_session(&self) -> SessionState {
        match self.api.get_authed(&routes::me()).await {
            Ok(Some(_)) => SessionState::SignedIn,
            Ok(None) => SessionState::SignedOut,
            Err(err) => {
                warn!(error = ?err, "stored session rejected");
                if let Err(err) = self.api.credentials().clear().await {
                    warn!(error = ?err, "failed to clear access token");
                }
                SessionState::SignedOut
            }
        }
    }
}
