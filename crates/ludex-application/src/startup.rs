//! Staggered initial cache loads.
//!
//! The four caches share one session controller; firing all four list
//! fetches the instant authentication resolves would hit the server with a
//! burst. Each family instead waits a small, family-specific delay, and a
//! loss of authentication while the delay is pending cancels the load.

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use ludex_core::resource::ResourceFamily;

use crate::resource_cache::ResourceCache;

/// The per-family delay between authentication resolving and the first
/// `load()`.
pub fn startup_delay(family: ResourceFamily) -> Duration {
    match family {
        ResourceFamily::Games => Duration::ZERO,
        ResourceFamily::Collections => Duration::from_millis(150),
        ResourceFamily::Developers => Duration::from_millis(300),
        ResourceFamily::Publishers => Duration::from_millis(450),
    }
}

/// Spawns the delayed first load for `cache`.
///
/// The task waits for the session phase to become authenticated, holds the
/// family delay, then loads once. If authentication drops while the delay
/// is pending, the load is cancelled; a later re-authentication is handled
/// by a fresh call to this function or an explicit `refresh()`.
pub fn spawn_initial_load(cache: &Arc<ResourceCache>, delay: Duration) -> JoinHandle<()> {
    let mut phase_rx = cache.session().watch_phase();
    let weak = Arc::downgrade(cache);

    tokio::spawn(async move {
        // Wait until authentication resolves.
        loop {
            if phase_rx.borrow_and_update().is_authenticated() {
                break;
            }
            if phase_rx.changed().await.is_err() {
                return;
            }
        }

        // Hold the family delay; losing authentication cancels the load.
        let mut sleep = pin!(tokio::time::sleep(delay));
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                changed = phase_rx.changed() => match changed {
                    Ok(()) => {
                        if !phase_rx.borrow_and_update().is_authenticated() {
                            return;
                        }
                    }
                    Err(_) => return,
                },
            }
        }

        if let Some(cache) = weak.upgrade() {
            cache.load().await;
        }
    })
}
