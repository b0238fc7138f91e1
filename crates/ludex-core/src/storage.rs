//! Client storage trait.
//!
//! Persisted key-value state scoped to the client installation: the
//! long-lived OAuth credential, its owning identity id, the OAuth client
//! pair, and the last-selected display language. Survives reloads; the
//! file-backed implementation lives in `ludex-infrastructure`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The locally configured OAuth client pair required to start a login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

/// Repository for persisted per-installation client state.
#[async_trait]
pub trait ClientStorage: Send + Sync {
    /// The persisted long-lived OAuth credential, if any.
    async fn oauth_credential(&self) -> Option<String>;

    async fn set_oauth_credential(&self, credential: String) -> Result<()>;

    /// Clears the credential together with its owning identity id.
    async fn clear_oauth_credential(&self) -> Result<()>;

    /// The identity id owning the persisted credential.
    async fn identity_id(&self) -> Option<String>;

    async fn set_identity_id(&self, id: String) -> Result<()>;

    /// The configured OAuth client pair, if both halves are present.
    async fn oauth_client(&self) -> Option<OAuthClient>;

    async fn set_oauth_client(&self, client: OAuthClient) -> Result<()>;

    /// The last-selected display language.
    async fn display_language(&self) -> Option<String>;

    async fn set_display_language(&self, language: String) -> Result<()>;
}
