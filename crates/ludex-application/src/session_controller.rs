//! Session controller.
//!
//! Owns the single authenticated-identity state machine: the startup
//! credential sweep over the three credential sources, validation against
//! the identity probe, persistence, logout, and the hard reset triggered by
//! the unauthorized interceptor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};

use ludex_api::UnauthorizedHandler;
use ludex_core::error::Result;
use ludex_core::gateway::{AuthGateway, Navigator};
use ludex_core::session::{Identity, Session, SessionPhase};
use ludex_core::storage::ClientStorage;

/// Static configuration for the session controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The deployment's base server URL, target of the hard-reset redirect.
    pub base_url: String,
    /// Development override credential, when one is configured for this
    /// deployment.
    pub override_credential: Option<String>,
}

/// One-time inputs from the navigation target at startup.
///
/// The presentation layer extracts a redirect-callback credential from the
/// current location (if the server just bounced the OAuth flow back) and
/// hands it here; it is consumed by exactly one credential sweep.
#[derive(Debug, Clone, Default)]
pub struct AuthBootstrap {
    pub callback_credential: Option<String>,
}

impl AuthBootstrap {
    pub fn with_callback_credential(credential: impl Into<String>) -> Self {
        Self {
            callback_credential: Some(credential.into()),
        }
    }
}

/// Read-only view of the session shared with every other component.
///
/// Consumers re-derive behavior from the current phase and credential
/// instead of caching copies that could drift.
#[derive(Clone)]
pub struct SessionReader {
    session: Arc<RwLock<Session>>,
    phase_rx: watch::Receiver<SessionPhase>,
}

impl SessionReader {
    /// The current phase, without touching the session lock.
    pub fn phase(&self) -> SessionPhase {
        *self.phase_rx.borrow()
    }

    /// A watch receiver observing phase transitions.
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase_rx.clone()
    }

    /// The active bearer credential, if any.
    pub async fn credential(&self) -> Option<String> {
        self.session.read().await.credential.clone()
    }

    /// A full copy of the current session record.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }
}

/// The single writer of the process-wide [`Session`].
pub struct SessionController {
    session: Arc<RwLock<Session>>,
    phase_tx: watch::Sender<SessionPhase>,
    storage: Arc<dyn ClientStorage>,
    auth: Arc<dyn AuthGateway>,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    /// Coalesces re-entrant credential sweeps.
    checking: AtomicBool,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        storage: Arc<dyn ClientStorage>,
        auth: Arc<dyn AuthGateway>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Checking);
        Self {
            session: Arc::new(RwLock::new(Session::checking())),
            phase_tx,
            storage,
            auth,
            navigator,
            config,
            checking: AtomicBool::new(false),
        }
    }

    /// Returns a read-only view of the session.
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            session: Arc::clone(&self.session),
            phase_rx: self.phase_tx.subscribe(),
        }
    }

    /// Runs the startup credential sweep.
    ///
    /// Sources are inspected in strict priority order: the one-time
    /// redirect-callback credential, then the persisted long-lived
    /// credential, then the configured development override. A sweep
    /// already in flight coalesces re-entrant calls into a no-op.
    pub async fn check_auth(&self, bootstrap: AuthBootstrap) -> Result<()> {
        if self.checking.swap(true, Ordering::SeqCst) {
            tracing::debug!("credential sweep already in flight; coalescing");
            return Ok(());
        }

        let result = self.run_credential_sweep(bootstrap).await;
        self.checking.store(false, Ordering::SeqCst);
        result
    }

    async fn run_credential_sweep(&self, bootstrap: AuthBootstrap) -> Result<()> {
        self.set_checking().await;

        if let Some(credential) = bootstrap.callback_credential {
            if self.is_override(&credential) {
                return self.establish_override(credential).await;
            }

            // Persist the one-time callback credential before probing it, so
            // a mid-validation reload can pick it up from storage.
            self.storage.set_oauth_credential(credential.clone()).await?;
            let client_id = self.storage.oauth_client().await.map(|c| c.client_id);

            match self
                .auth
                .fetch_identity(&credential, client_id.as_deref())
                .await
            {
                Ok(identity) => {
                    return self
                        .establish_oauth(identity, credential)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "callback credential rejected; discarding");
                    self.storage.clear_oauth_credential().await?;
                    // Explicit rejection: fall through to the override.
                }
            }
        } else if let Some(credential) = self.storage.oauth_credential().await {
            match self.storage.oauth_client().await {
                Some(client) => match self
                    .auth
                    .fetch_identity(&credential, Some(&client.client_id))
                    .await
                {
                    Ok(identity) => {
                        return self.establish_oauth(identity, credential).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "persisted credential rejected; discarding");
                        self.storage.clear_oauth_credential().await?;
                        // Explicit rejection: fall through to the override.
                    }
                },
                None => {
                    // A credential is present but cannot be probed without
                    // its OAuth client id. It was never rejected by the
                    // server, so the override does not kick in.
                    tracing::debug!(
                        "persisted credential has no OAuth client id; staying unauthenticated"
                    );
                    self.set_unauthenticated().await;
                    return Ok(());
                }
            }
        }

        match self.config.override_credential.clone() {
            Some(credential) => self.establish_override(credential).await,
            None => {
                self.set_unauthenticated().await;
                Ok(())
            }
        }
    }

    /// Starts the OAuth login flow with a full-page redirect.
    ///
    /// A no-op when no OAuth client pair is configured; the presentation
    /// layer is expected to prompt for configuration instead. Does not
    /// change the session phase.
    pub async fn login(&self, force_verify: bool) -> Result<()> {
        let Some(client) = self.storage.oauth_client().await else {
            tracing::debug!("login requested without a configured OAuth client; ignoring");
            return Ok(());
        };

        let auth_url = self
            .auth
            .start_authorization(&client.client_id, &client.client_secret, force_verify)
            .await?;
        self.navigator.redirect(&auth_url);
        Ok(())
    }

    /// Clears all credential material and resets to `Unauthenticated`.
    ///
    /// Server-side revocation is fire-and-forget; a failure there is logged
    /// and otherwise ignored.
    pub async fn logout(&self) -> Result<()> {
        let credential = {
            let mut session = self.session.write().await;
            let credential = session.credential.take();
            session.reset();
            credential
        };
        self.phase_tx.send_replace(SessionPhase::Unauthenticated);
        tracing::info!("session reset to unauthenticated");

        self.storage.clear_oauth_credential().await?;

        if let Some(credential) = credential {
            let auth = Arc::clone(&self.auth);
            tokio::spawn(async move {
                if let Err(e) = auth.revoke(&credential).await {
                    tracing::warn!(error = %e, "credential revocation failed");
                }
            });
        }

        Ok(())
    }

    /// Logout plus a full navigation back to the deployment base URL.
    ///
    /// This is the hard reset used when the server unilaterally revoked the
    /// credential and the client's view of session state has desynchronized.
    pub async fn invalidate_from_interceptor(&self) -> Result<()> {
        tracing::info!("credential rejected by the server; resetting session");
        self.logout().await?;
        self.navigator.redirect(&self.config.base_url);
        Ok(())
    }

    fn is_override(&self, credential: &str) -> bool {
        self.config
            .override_credential
            .as_deref()
            .is_some_and(|o| o == credential)
    }

    /// Validates the override credential; a failed probe still yields
    /// `DevOverride` with a placeholder identity so development continues
    /// when the server is unreachable.
    async fn establish_override(&self, credential: String) -> Result<()> {
        let identity = match self.auth.fetch_identity(&credential, None).await {
            Ok(mut identity) => {
                identity.is_development_identity = true;
                identity
            }
            Err(e) => {
                tracing::warn!(error = %e, "override probe failed; using placeholder identity");
                Identity::development_placeholder()
            }
        };

        self.set_established(identity, credential, SessionPhase::DevOverride)
            .await;
        Ok(())
    }

    async fn establish_oauth(&self, identity: Identity, credential: String) -> Result<()> {
        self.storage.set_identity_id(identity.id.clone()).await?;
        self.set_established(identity, credential, SessionPhase::Authenticated)
            .await;
        Ok(())
    }

    async fn set_established(
        &self,
        identity: Identity,
        credential: String,
        phase: SessionPhase,
    ) {
        {
            let mut session = self.session.write().await;
            session.establish(identity, credential, phase);
        }
        self.phase_tx.send_replace(phase);
        tracing::info!(phase = ?phase, "session established");
    }

    async fn set_checking(&self) {
        *self.session.write().await = Session::checking();
        self.phase_tx.send_replace(SessionPhase::Checking);
    }

    async fn set_unauthenticated(&self) {
        *self.session.write().await = Session::unauthenticated();
        self.phase_tx.send_replace(SessionPhase::Unauthenticated);
    }
}

/// The interceptor path: every qualifying rejected-credential response
/// funnels into a full session invalidation. Repeated invocations are
/// harmless because logout is idempotent.
#[async_trait]
impl UnauthorizedHandler for SessionController {
    async fn on_unauthorized(&self) {
        if let Err(e) = self.invalidate_from_interceptor().await {
            tracing::warn!(error = %e, "session invalidation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingNavigator, ScriptedAuth};
    use ludex_core::storage::OAuthClient;
    use ludex_infrastructure::MemoryClientStorage;

    fn config(override_credential: Option<&str>) -> SessionConfig {
        SessionConfig {
            base_url: "https://library.example.test".to_string(),
            override_credential: override_credential.map(str::to_string),
        }
    }

    fn controller(
        config: SessionConfig,
        auth: Arc<ScriptedAuth>,
        storage: Arc<MemoryClientStorage>,
    ) -> (Arc<SessionController>, Arc<RecordingNavigator>) {
        let navigator = Arc::new(RecordingNavigator::default());
        let controller = Arc::new(SessionController::new(
            config,
            storage,
            auth,
            navigator.clone(),
        ));
        (controller, navigator)
    }

    async fn seed_oauth_client(storage: &MemoryClientStorage) {
        storage
            .set_oauth_client(OAuthClient {
                client_id: "cid".to_string(),
                client_secret: "sec".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_callback_credential_wins_over_persisted_and_override() {
        let auth = Arc::new(ScriptedAuth::default());
        auth.allow("callback-token", "1", "Callback User");
        auth.allow("persisted-token", "2", "Persisted User");
        auth.allow("override-token", "3", "Override User");

        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;
        storage
            .set_oauth_credential("persisted-token".to_string())
            .await
            .unwrap();

        let (controller, _) = controller(config(Some("override-token")), auth, storage);
        controller
            .check_auth(AuthBootstrap::with_callback_credential("callback-token"))
            .await
            .unwrap();

        let session = controller.reader().snapshot().await;
        assert_eq!(session.phase, SessionPhase::Authenticated);
        assert_eq!(session.identity.unwrap().display_name, "Callback User");
        assert_eq!(session.credential.as_deref(), Some("callback-token"));
    }

    #[tokio::test]
    async fn test_callback_credential_is_persisted() {
        let auth = Arc::new(ScriptedAuth::default());
        auth.allow("callback-token", "1", "Callback User");

        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;

        let (controller, _) = controller(config(None), auth, storage.clone());
        controller
            .check_auth(AuthBootstrap::with_callback_credential("callback-token"))
            .await
            .unwrap();

        assert_eq!(
            storage.oauth_credential().await,
            Some("callback-token".to_string())
        );
        assert_eq!(storage.identity_id().await, Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_override_survives_failed_probe() {
        // Nothing is allowed: every probe fails.
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());

        let (controller, _) = controller(config(Some("override-token")), auth, storage);
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        let session = controller.reader().snapshot().await;
        assert_eq!(session.phase, SessionPhase::DevOverride);
        let identity = session.identity.unwrap();
        assert!(identity.is_development_identity);
        assert_eq!(session.credential.as_deref(), Some("override-token"));
    }

    #[tokio::test]
    async fn test_override_uses_server_identity_when_probe_succeeds() {
        let auth = Arc::new(ScriptedAuth::default());
        auth.allow("override-token", "9", "Real Dev");
        let storage = Arc::new(MemoryClientStorage::new());

        let (controller, _) = controller(config(Some("override-token")), auth, storage);
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        let session = controller.reader().snapshot().await;
        assert_eq!(session.phase, SessionPhase::DevOverride);
        let identity = session.identity.unwrap();
        assert_eq!(identity.display_name, "Real Dev");
        assert!(identity.is_development_identity);
    }

    #[tokio::test]
    async fn test_rejected_persisted_credential_clears_storage() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;
        storage
            .set_oauth_credential("stale-token".to_string())
            .await
            .unwrap();
        storage.set_identity_id("2".to_string()).await.unwrap();

        let (controller, _) = controller(config(None), auth, storage.clone());
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        let session = controller.reader().snapshot().await;
        assert_eq!(session.phase, SessionPhase::Unauthenticated);
        assert!(storage.oauth_credential().await.is_none());
        assert!(storage.identity_id().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_persisted_credential_falls_through_to_override() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;
        storage
            .set_oauth_credential("stale-token".to_string())
            .await
            .unwrap();

        let (controller, _) =
            controller(config(Some("override-token")), auth, storage.clone());
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        let session = controller.reader().snapshot().await;
        assert_eq!(session.phase, SessionPhase::DevOverride);
        assert!(storage.oauth_credential().await.is_none());
    }

    #[tokio::test]
    async fn test_unused_persisted_credential_does_not_reach_override() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());
        // Credential present but no OAuth client id, so it is never probed.
        storage
            .set_oauth_credential("unprobed-token".to_string())
            .await
            .unwrap();

        let (controller, _) = controller(config(Some("override-token")), auth.clone(), storage);
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        assert_eq!(
            controller.reader().phase(),
            SessionPhase::Unauthenticated
        );
        assert_eq!(auth.probe_count(), 0);
    }

    #[tokio::test]
    async fn test_no_sources_means_unauthenticated() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());

        let (controller, _) = controller(config(None), auth.clone(), storage);
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        assert_eq!(controller.reader().phase(), SessionPhase::Unauthenticated);
        assert_eq!(auth.probe_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_check_auth_is_coalesced() {
        let auth = Arc::new(ScriptedAuth::default());
        auth.allow("persisted-token", "2", "Persisted User");
        auth.hold_probes();

        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;
        storage
            .set_oauth_credential("persisted-token".to_string())
            .await
            .unwrap();

        let (controller, _) = controller(config(None), auth.clone(), storage);

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.check_auth(AuthBootstrap::default()).await })
        };
        tokio::task::yield_now().await;

        // Second sweep while the first is blocked on the probe.
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        auth.release_probes();
        first.await.unwrap().unwrap();

        assert_eq!(auth.probe_count(), 1);
        assert_eq!(controller.reader().phase(), SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_login_without_oauth_client_is_a_noop() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());

        let (controller, navigator) = controller(config(None), auth.clone(), storage);
        controller.login(false).await.unwrap();

        assert!(navigator.redirects().is_empty());
        assert_eq!(auth.authorization_count(), 0);
    }

    #[tokio::test]
    async fn test_login_redirects_to_authorization_url() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;

        let (controller, navigator) = controller(config(None), auth, storage);
        controller.login(true).await.unwrap();

        let redirects = navigator.redirects();
        assert_eq!(redirects.len(), 1);
        assert!(redirects[0].contains("force_verify=true"));
        // Login never changes the phase by itself.
        assert_eq!(controller.reader().phase(), SessionPhase::Checking);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_storage() {
        let auth = Arc::new(ScriptedAuth::default());
        auth.allow("persisted-token", "2", "Persisted User");
        let storage = Arc::new(MemoryClientStorage::new());
        seed_oauth_client(&storage).await;
        storage
            .set_oauth_credential("persisted-token".to_string())
            .await
            .unwrap();

        let (controller, _) = controller(config(None), auth, storage.clone());
        controller.check_auth(AuthBootstrap::default()).await.unwrap();
        assert_eq!(controller.reader().phase(), SessionPhase::Authenticated);

        controller.logout().await.unwrap();

        let session = controller.reader().snapshot().await;
        assert_eq!(session.phase, SessionPhase::Unauthenticated);
        assert!(session.identity.is_none());
        assert!(session.credential.is_none());
        assert!(storage.oauth_credential().await.is_none());
        assert!(storage.identity_id().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_redirects_to_base_url() {
        let auth = Arc::new(ScriptedAuth::default());
        let storage = Arc::new(MemoryClientStorage::new());

        let (controller, navigator) =
            controller(config(Some("override-token")), auth, storage);
        controller.check_auth(AuthBootstrap::default()).await.unwrap();

        controller.invalidate_from_interceptor().await.unwrap();

        assert_eq!(controller.reader().phase(), SessionPhase::Unauthenticated);
        assert_eq!(
            navigator.redirects(),
            vec!["https://library.example.test".to_string()]
        );
    }
}
