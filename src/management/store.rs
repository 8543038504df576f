use std::{future::Future, path::PathBuf, sync::Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config,
    error::StoreError,
    management::status::TokenStatus,
    types::{Credentials, TokenRecord},
};

/// Flat on-disk shape of the store.
///
/// Absent optional token fields are written as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredState {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub token: TokenRecord,
}

/// Persistence contract behind [`CredentialStore`].
pub trait StoreBackend: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> impl Future<Output = Result<Option<StoredState>, StoreError>> + Send;

    fn save(&self, state: &StoredState) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// JSON file in the local data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    /// `<data_local_dir>/spotctl/credentials.json`
    pub fn default_location() -> Self {
        FileBackend::new(config::data_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl StoreBackend for FileBackend {
    async fn load(&self) -> Result<Option<StoredState>, StoreError> {
        if !self.path.is_file() {
            debug!(path = %self.path.display(), "no stored credentials");
            return Ok(None);
        }

        let content = async_fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(state)?;

        // Owner-only before any secret is written. `mode` applies to new
        // files; an existing file is tightened explicitly.
        let mut options = async_fs::OpenOptions::new();
        options.write(true).create(true);
        #[cfg(unix)]
        {
            use async_fs::unix::OpenOptionsExt;
            options.mode(0o600);
        }
        drop(options.open(&self.path).await?);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            async_fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        async_fs::write(&self.path, json).await?;

        debug!(path = %self.path.display(), "credentials persisted");
        Ok(())
    }
}

/// In-process backend, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<Option<StoredState>>,
}

impl MemoryBackend {
    pub fn new(initial: Option<StoredState>) -> Self {
        MemoryBackend {
            state: Mutex::new(initial),
        }
    }

    pub fn snapshot(&self) -> Option<StoredState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<StoredState>, StoreError> {
        Ok(self.snapshot())
    }

    async fn save(&self, state: &StoredState) -> Result<(), StoreError> {
        *self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(state.clone());
        Ok(())
    }
}

/// Owner of the current credentials and token.
///
/// Flows only borrow [`Credentials`] and hand back a new [`TokenRecord`];
/// committing it here is the caller's decision. The store is single-writer:
/// callers that share it across tasks must wrap it in a mutex.
pub struct CredentialStore<B: StoreBackend = FileBackend> {
    backend: B,
    credentials: Credentials,
    token: TokenRecord,
}

impl CredentialStore<FileBackend> {
    pub async fn open_default() -> Result<Self, StoreError> {
        Self::open(FileBackend::default_location()).await
    }
}

impl<B: StoreBackend> CredentialStore<B> {
    pub async fn open(backend: B) -> Result<Self, StoreError> {
        let stored = backend.load().await?.unwrap_or_default();
        Ok(CredentialStore {
            backend,
            credentials: stored.credentials,
            token: stored.token,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_configured()
    }

    pub fn token(&self) -> &TokenRecord {
        &self.token
    }

    pub fn set_token(&mut self, token: TokenRecord) {
        self.token = token;
    }

    /// Blanks the token; credentials are kept.
    pub fn clear_token(&mut self) {
        self.token.clear();
    }

    pub fn status(&self, now: DateTime<Utc>) -> TokenStatus {
        TokenStatus::evaluate(&self.token, now)
    }

    pub async fn persist(&self) -> Result<(), StoreError> {
        let state = StoredState {
            credentials: self.credentials.clone(),
            token: self.token.clone(),
        };
        self.backend.save(&state).await
    }
}
