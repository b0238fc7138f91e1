//! In-memory client storage.
//!
//! A [`ClientStorage`] double for tests and ephemeral deployments; nothing
//! survives the process.

use async_trait::async_trait;
use tokio::sync::RwLock;

use ludex_core::error::Result;
use ludex_core::storage::{ClientStorage, OAuthClient};

use crate::storage::ClientState;

/// [`ClientStorage`] held entirely in memory.
#[derive(Default)]
pub struct MemoryClientStorage {
    state: RwLock<ClientState>,
}

impl MemoryClientStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-seeded with `state`.
    pub fn with_state(state: ClientState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Snapshot of the current state.
    pub async fn snapshot(&self) -> ClientState {
        self.state.read().await.clone()
    }
}

#[async_trait]
impl ClientStorage for MemoryClientStorage {
    async fn oauth_credential(&self) -> Option<String> {
        self.state.read().await.oauth_credential.clone()
    }

    async fn set_oauth_credential(&self, credential: String) -> Result<()> {
        self.state.write().await.oauth_credential = Some(credential);
        Ok(())
    }

    async fn clear_oauth_credential(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.oauth_credential = None;
        state.identity_id = None;
        Ok(())
    }

    async fn identity_id(&self) -> Option<String> {
        self.state.read().await.identity_id.clone()
    }

    async fn set_identity_id(&self, id: String) -> Result<()> {
        self.state.write().await.identity_id = Some(id);
        Ok(())
    }

    async fn oauth_client(&self) -> Option<OAuthClient> {
        let state = self.state.read().await;
        match (&state.oauth_client_id, &state.oauth_client_secret) {
            (Some(client_id), Some(client_secret)) => Some(OAuthClient {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
            }),
            _ => None,
        }
    }

    async fn set_oauth_client(&self, client: OAuthClient) -> Result<()> {
        let mut state = self.state.write().await;
        state.oauth_client_id = Some(client.client_id);
        state.oauth_client_secret = Some(client.client_secret);
        Ok(())
    }

    async fn display_language(&self) -> Option<String> {
        self.state.read().await.display_language.clone()
    }

    async fn set_display_language(&self, language: String) -> Result<()> {
        self.state.write().await.display_language = Some(language);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_state_is_visible() {
        let storage = MemoryClientStorage::with_state(ClientState {
            oauth_credential: Some("tok".to_string()),
            identity_id: Some("7".to_string()),
            ..ClientState::default()
        });

        assert_eq!(storage.oauth_credential().await, Some("tok".to_string()));
        assert_eq!(storage.identity_id().await, Some("7".to_string()));
    }

    #[tokio::test]
    async fn test_clear_drops_credential_and_identity() {
        let storage = MemoryClientStorage::new();
        storage.set_oauth_credential("tok".to_string()).await.unwrap();
        storage.set_identity_id("7".to_string()).await.unwrap();

        storage.clear_oauth_credential().await.unwrap();

        let snapshot = storage.snapshot().await;
        assert!(snapshot.oauth_credential.is_none());
        assert!(snapshot.identity_id.is_none());
    }
}
