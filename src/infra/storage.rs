use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Secure key/value slot for the access token.
///
/// Stands in for the platform keystore: one opaque value, written at
/// sign-in, cleared at sign-out, read by every authenticated request.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> BoxFuture<'_, Result<Option<String>>>;
    fn set(&self, token: String) -> BoxFuture<'_, Result<()>>;
    fn clear(&self) -> BoxFuture<'_, Result<()>>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> BoxFuture<'_, Result<Option<String>>> {
        async move { Ok(self.token.read().await.clone()) }.boxed()
    }

    fn set(&self, token: String) -> BoxFuture<'_, Result<()>> {
        async move {
            *self.token.write().await = Some(token);
            Ok(())
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            *self.token.write().await = None;
            Ok(())
        }
        .boxed()
    }
}

/// Token kept in a single file, readable only by the owner on unix.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> BoxFuture<'_, Result<Option<String>>> {
        async move {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(contents) => {
                    let token = contents.trim();
                    Ok((!token.is_empty()).then(|| token.to_string()))
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err)
                    .with_context(|| format!("failed to read token from {}", self.path.display())),
            }
        }
        .boxed()
    }

    fn set(&self, token: String) -> BoxFuture<'_, Result<()>> {
        async move {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.with_context(|| {
                        format!("failed to create token directory {}", parent.display())
                    })?;
                }
            }
            tokio::fs::write(&self.path, token.as_bytes())
                .await
                .with_context(|| format!("failed to write token to {}", self.path.display()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let permissions = std::fs::Permissions::from_mode(0o600);
                tokio::fs::set_permissions(&self.path, permissions).await?;
            }

            Ok(())
        }
        .boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        async move {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err)
                    .with_context(|| format!("failed to remove token {}", self.path.display())),
            }
        }
        .boxed()
    }
}

/// Credential provider handed to every request-issuing component.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn TokenStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Current token. A store that fails to read counts as signed out.
    pub async fn token(&self) -> Option<String> {
        match self.store.get().await {
            Ok(token) => token,
            Err(err) => {
                tracing::warn!(error = ?err, "failed to read access token");
                None
            }
        }
    }

    pub async fn save(&self, token: impl Into<String>) -> Result<()> {
        self.store.set(token.into()).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }
}
