//! Resource cache.
//!
//! One instance per resource family holds the authoritative in-memory list
//! for that family, answers fine-grained local mutations from UI actions,
//! and reconciles itself from event-bus notifications. Mutating surfaces
//! that already have the resulting item patch locally through the bus;
//! partial signals (`membershipChanged`, `metadataReloaded`) trigger a full
//! reload because only the server knows the correct denormalized shape.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockWriteGuard};

use ludex_core::event::{ChangeEvent, EventBus, Subscription, family_topics};
use ludex_core::gateway::ResourceGateway;
use ludex_core::resource::{ResourceFamily, ResourceItem};

use crate::session_controller::SessionReader;

/// A point-in-time copy of the cache contents for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    pub items: Vec<ResourceItem>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct CacheState {
    items: Vec<ResourceItem>,
    is_loading: bool,
    error: Option<String>,
    /// Token of the newest issued fetch; only that fetch may commit.
    last_fetch_token: u64,
}

/// The authoritative in-memory list for one resource family.
pub struct ResourceCache {
    family: ResourceFamily,
    state: RwLock<CacheState>,
    fetch_seq: AtomicU64,
    session: SessionReader,
    gateway: Arc<dyn ResourceGateway>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ResourceCache {
    pub fn new(
        family: ResourceFamily,
        session: SessionReader,
        gateway: Arc<dyn ResourceGateway>,
    ) -> Self {
        Self {
            family,
            state: RwLock::new(CacheState::default()),
            fetch_seq: AtomicU64::new(0),
            session,
            gateway,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn family(&self) -> ResourceFamily {
        self.family
    }

    pub fn session(&self) -> &SessionReader {
        &self.session
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> CacheSnapshot {
        let state = self
            .state
            .read()
            .expect("cache state lock poisoned");
        CacheSnapshot {
            items: state.items.clone(),
            is_loading: state.is_loading,
            error: state.error.clone(),
        }
    }

    /// A copy of the current item list.
    pub fn items(&self) -> Vec<ResourceItem> {
        self.state
            .read()
            .expect("cache state lock poisoned")
            .items
            .clone()
    }

    /// Inserts or replaces by id, keeping the ascending case-insensitive
    /// title order. Idempotent under duplicate adds of the same id.
    pub fn add(&self, item: ResourceItem) {
        let mut state = self.state_mut();
        match state.items.iter().position(|existing| existing.id == item.id) {
            Some(index) => state.items[index] = item,
            None => state.items.push(item),
        }
        state.items.sort_by_key(|i| i.sort_key());
    }

    /// Replaces the entry with matching id; no-op if absent.
    pub fn update(&self, item: ResourceItem) {
        let mut state = self.state_mut();
        let Some(index) = state.items.iter().position(|e| e.id == item.id) else {
            return;
        };
        state.items[index] = item;
        state.items.sort_by_key(|i| i.sort_key());
    }

    /// Deletes the entry with matching id; no-op if absent.
    pub fn remove(&self, id: &str) {
        let mut state = self.state_mut();
        state.items.retain(|item| item.id != id);
    }

    /// Fetches the full list and replaces the contents wholesale.
    ///
    /// A no-op while the session has no credential. On failure the previous
    /// items stay in place and the error is recorded. Concurrent loads are
    /// tolerated: the fetch token taken here guarantees last-fetch-wins, so
    /// an older response arriving late can no longer commit.
    pub async fn load(&self) {
        if !self.session.phase().is_authenticated() {
            tracing::debug!(family = %self.family, "load skipped: no credential yet");
            return;
        }
        let Some(credential) = self.session.credential().await else {
            return;
        };

        let token = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state_mut();
            state.is_loading = true;
            state.last_fetch_token = token;
        }

        let result = self.gateway.list(self.family, &credential).await;

        let mut state = self.state_mut();
        if state.last_fetch_token != token {
            // A newer fetch owns the state now; this result is stale.
            tracing::debug!(family = %self.family, "discarding stale fetch result");
            return;
        }
        state.is_loading = false;

        match result {
            Ok(mut items) => {
                items.sort_by_key(|i| i.sort_key());
                state.items = items;
                state.error = None;
            }
            Err(e) => {
                tracing::warn!(family = %self.family, error = %e, "list fetch failed; keeping previous items");
                state.error = Some(e.to_string());
            }
        }
    }

    /// Forced resync for external callers; alias for [`load`](Self::load).
    pub async fn refresh(&self) {
        self.load().await;
    }

    /// Subscribes this cache to its family's topics plus `metadataReloaded`.
    ///
    /// Handlers hold only a weak reference, so dropping the cache (which
    /// drops the subscriptions) detaches it from the bus.
    pub fn attach(self: &Arc<Self>, bus: &EventBus) {
        let mut subscriptions = Vec::new();
        for topic in family_topics(self.family) {
            let weak = Arc::downgrade(self);
            subscriptions.push(bus.subscribe(topic, move |event| {
                if let Some(cache) = weak.upgrade() {
                    cache.on_event(event);
                }
            }));
        }
        *self
            .subscriptions
            .lock()
            .expect("subscriptions lock poisoned") = subscriptions;
    }

    fn on_event(self: Arc<Self>, event: &ChangeEvent) {
        match event {
            ChangeEvent::Added { family, item } if *family == self.family => {
                self.add(item.clone());
            }
            ChangeEvent::Updated { family, item } if *family == self.family => {
                self.update(item.clone());
            }
            ChangeEvent::Deleted { family, id } if *family == self.family => {
                self.remove(id);
            }
            ChangeEvent::MembershipChanged { family } if *family == self.family => {
                self.spawn_reload();
            }
            ChangeEvent::ReloadAll => self.spawn_reload(),
            _ => {}
        }
    }

    /// Reload off the synchronous dispatch path. Requires a tokio runtime,
    /// which every reload-triggering publish site runs under.
    fn spawn_reload(self: Arc<Self>) {
        tokio::spawn(async move {
            self.load().await;
        });
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().expect("cache state lock poisoned")
    }
}
