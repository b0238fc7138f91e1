//! File-backed client storage.
//!
//! Persists the per-installation key-value state (OAuth credential and its
//! owning identity id, OAuth client pair, display language) as a single
//! TOML document under the platform config dir.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ludex_core::error::{LudexError, Result};
use ludex_core::storage::{ClientStorage, OAuthClient};

use super::atomic_toml::AtomicTomlFile;
use crate::paths::LudexPaths;

/// On-disk shape of the persisted client state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    /// Long-lived OAuth bearer credential.
    pub oauth_credential: Option<String>,
    /// Identity id owning the credential.
    pub identity_id: Option<String>,
    /// Configured OAuth client id.
    pub oauth_client_id: Option<String>,
    /// Configured OAuth client secret.
    pub oauth_client_secret: Option<String>,
    /// Last-selected display language (BCP 47 tag).
    pub display_language: Option<String>,
}

/// [`ClientStorage`] backed by an atomic TOML file.
pub struct FileClientStorage {
    file: AtomicTomlFile<ClientState>,
}

impl FileClientStorage {
    /// Creates storage at the default location (`~/.config/ludex/client.toml`).
    pub fn new() -> Result<Self> {
        let path = LudexPaths::client_state_file()
            .map_err(|e| LudexError::data_access(e.to_string()))?;
        Ok(Self::with_path(path))
    }

    /// Creates storage at a custom path (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    fn read_state(&self) -> Result<ClientState> {
        self.file
            .load()
            .map(Option::unwrap_or_default)
            .map_err(|e| LudexError::data_access(e.to_string()))
    }

    fn update_state<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ClientState),
    {
        self.file
            .update(ClientState::default(), f)
            .map_err(|e| LudexError::data_access(e.to_string()))
    }
}

#[async_trait]
impl ClientStorage for FileClientStorage {
    async fn oauth_credential(&self) -> Option<String> {
        self.read_state().ok().and_then(|s| s.oauth_credential)
    }

    async fn set_oauth_credential(&self, credential: String) -> Result<()> {
        self.update_state(|state| state.oauth_credential = Some(credential))
    }

    async fn clear_oauth_credential(&self) -> Result<()> {
        self.update_state(|state| {
            state.oauth_credential = None;
            state.identity_id = None;
        })
    }

    async fn identity_id(&self) -> Option<String> {
        self.read_state().ok().and_then(|s| s.identity_id)
    }

    async fn set_identity_id(&self, id: String) -> Result<()> {
        self.update_state(|state| state.identity_id = Some(id))
    }

    async fn oauth_client(&self) -> Option<OAuthClient> {
        let state = self.read_state().ok()?;
        match (state.oauth_client_id, state.oauth_client_secret) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClient {
                client_id,
                client_secret,
            }),
            _ => None,
        }
    }

    async fn set_oauth_client(&self, client: OAuthClient) -> Result<()> {
        self.update_state(|state| {
            state.oauth_client_id = Some(client.client_id);
            state.oauth_client_secret = Some(client.client_secret);
        })
    }

    async fn display_language(&self) -> Option<String> {
        self.read_state().ok().and_then(|s| s.display_language)
    }

    async fn set_display_language(&self, language: String) -> Result<()> {
        self.update_state(|state| state.display_language = Some(language))
    }
}
