//! Ludex application layer: session lifecycle and the reactive caches.
//!
//! [`LibraryCore`] is the composition root the presentation layer holds:
//! one session controller, one event bus, and one resource cache per
//! family, wired so that a mutation published from any UI surface
//! converges every cache.

pub mod resource_cache;
pub mod session_controller;
pub mod startup;
pub mod testing;

pub use resource_cache::{CacheSnapshot, ResourceCache};
pub use session_controller::{
    AuthBootstrap, SessionConfig, SessionController, SessionReader,
};
pub use startup::{spawn_initial_load, startup_delay};

use std::sync::Arc;

use tokio::task::JoinHandle;

use ludex_api::ApiClient;
use ludex_core::event::EventBus;
use ludex_core::gateway::{AuthGateway, Navigator, ResourceGateway};
use ludex_core::resource::ResourceFamily;
use ludex_core::storage::ClientStorage;

/// The fully wired client core.
pub struct LibraryCore {
    pub bus: EventBus,
    pub session: Arc<SessionController>,
    pub games: Arc<ResourceCache>,
    pub collections: Arc<ResourceCache>,
    pub developers: Arc<ResourceCache>,
    pub publishers: Arc<ResourceCache>,
}

impl LibraryCore {
    /// Wires a core from explicit gateway implementations.
    pub fn new(
        config: SessionConfig,
        storage: Arc<dyn ClientStorage>,
        auth: Arc<dyn AuthGateway>,
        resources: Arc<dyn ResourceGateway>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let bus = EventBus::new();
        let session = Arc::new(SessionController::new(config, storage, auth, navigator));
        let reader = session.reader();

        let make_cache = |family: ResourceFamily| {
            let cache = Arc::new(ResourceCache::new(
                family,
                reader.clone(),
                Arc::clone(&resources),
            ));
            cache.attach(&bus);
            cache
        };

        Self {
            games: make_cache(ResourceFamily::Games),
            collections: make_cache(ResourceFamily::Collections),
            developers: make_cache(ResourceFamily::Developers),
            publishers: make_cache(ResourceFamily::Publishers),
            bus,
            session,
        }
    }

    /// Wires a core against the HTTP API client and registers the session
    /// controller as the unauthorized handler.
    pub fn with_api_client(
        config: SessionConfig,
        api: Arc<ApiClient>,
        storage: Arc<dyn ClientStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let core = Self::new(
            config,
            storage,
            api.clone() as Arc<dyn AuthGateway>,
            api.clone() as Arc<dyn ResourceGateway>,
            navigator,
        );
        api.set_unauthorized_handler(core.session.clone());
        core
    }

    /// The cache for `family`.
    pub fn cache(&self, family: ResourceFamily) -> &Arc<ResourceCache> {
        match family {
            ResourceFamily::Games => &self.games,
            ResourceFamily::Collections => &self.collections,
            ResourceFamily::Developers => &self.developers,
            ResourceFamily::Publishers => &self.publishers,
        }
    }

    /// Spawns the staggered first load for every cache.
    ///
    /// Call once at bootstrap, before or after `check_auth`; the tasks wait
    /// for authentication to resolve on their own.
    pub fn spawn_initial_loads(&self) -> Vec<JoinHandle<()>> {
        ResourceFamily::ALL
            .iter()
            .map(|family| spawn_initial_load(self.cache(*family), startup_delay(*family)))
            .collect()
    }
}
