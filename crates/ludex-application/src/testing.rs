//! Test doubles for the gateway seams.
//!
//! Scripted implementations of [`AuthGateway`], [`ResourceGateway`], and
//! [`Navigator`] used by the crate's own tests and available to consumers
//! testing their wiring.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use ludex_core::error::{LudexError, Result};
use ludex_core::gateway::{AuthGateway, Navigator, ResourceGateway};
use ludex_core::resource::{ResourceFamily, ResourceItem};
use ludex_core::session::Identity;

/// [`AuthGateway`] double with a scripted set of accepted credentials.
///
/// Unknown credentials are rejected with a 401, mirroring the identity
/// probe's contract. Probes can be held open to exercise interleavings.
pub struct ScriptedAuth {
    identities: Mutex<HashMap<String, Identity>>,
    probes: AtomicUsize,
    authorizations: AtomicUsize,
    revoked: Mutex<Vec<String>>,
    release_tx: watch::Sender<bool>,
}

impl Default for ScriptedAuth {
    fn default() -> Self {
        let (release_tx, _) = watch::channel(true);
        Self {
            identities: Mutex::new(HashMap::new()),
            probes: AtomicUsize::new(0),
            authorizations: AtomicUsize::new(0),
            revoked: Mutex::new(Vec::new()),
            release_tx,
        }
    }
}

impl ScriptedAuth {
    /// Accepts `credential` and maps it to the given identity.
    pub fn allow(&self, credential: &str, id: &str, display_name: &str) {
        self.identities.lock().unwrap().insert(
            credential.to_string(),
            Identity {
                id: id.to_string(),
                display_name: display_name.to_string(),
                avatar_url: None,
                is_development_identity: false,
            },
        );
    }

    /// Blocks subsequent probes until [`release_probes`](Self::release_probes).
    pub fn hold_probes(&self) {
        self.release_tx.send_replace(false);
    }

    pub fn release_probes(&self) {
        self.release_tx.send_replace(true);
    }

    /// Number of identity probes issued so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of authorization-start calls issued so far.
    pub fn authorization_count(&self) -> usize {
        self.authorizations.load(Ordering::SeqCst)
    }

    /// Credentials the controller asked to revoke.
    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }

    async fn wait_for_release(&self) {
        let mut rx = self.release_tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl AuthGateway for ScriptedAuth {
    async fn fetch_identity(
        &self,
        credential: &str,
        _client_id: Option<&str>,
    ) -> Result<Identity> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await;

        let identity = self.identities.lock().unwrap().get(credential).cloned();
        identity.ok_or_else(|| LudexError::api(401, "invalid token"))
    }

    async fn start_authorization(
        &self,
        client_id: &str,
        _client_secret: &str,
        force_verify: bool,
    ) -> Result<String> {
        self.authorizations.fetch_add(1, Ordering::SeqCst);
        Ok(format!(
            "https://id.twitch.tv/oauth2/authorize?client_id={client_id}&force_verify={force_verify}"
        ))
    }

    async fn revoke(&self, credential: &str) -> Result<()> {
        self.revoked.lock().unwrap().push(credential.to_string());
        Ok(())
    }
}

/// [`ResourceGateway`] double returning queued responses in order.
///
/// Each queued response carries an artificial latency so tests can race
/// two fetches deterministically under a paused clock. With an empty
/// queue, calls resolve immediately with an empty list.
#[derive(Default)]
pub struct ScriptedResources {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<(Duration, Result<Vec<ResourceItem>>)>>,
}

impl ScriptedResources {
    pub fn push_response(&self, delay: Duration, result: Result<Vec<ResourceItem>>) {
        self.responses.lock().unwrap().push_back((delay, result));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceGateway for ScriptedResources {
    async fn list(
        &self,
        _family: ResourceFamily,
        _credential: &str,
    ) -> Result<Vec<ResourceItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (delay, result) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Duration::ZERO, Ok(Vec::new())));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// [`Navigator`] double recording every redirect target.
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        self.redirects.lock().unwrap().push(url.to_string());
    }
}
