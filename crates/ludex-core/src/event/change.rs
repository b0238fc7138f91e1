//! Change event envelopes carried on the event bus.

use serde::{Deserialize, Serialize};

use crate::resource::{ResourceFamily, ResourceItem};

/// Topic for a bulk metadata reload affecting every family.
pub const TOPIC_METADATA_RELOADED: &str = "metadataReloaded";

/// An immutable change notification published between caches and any other
/// interested consumer.
///
/// Events are transient: they are never persisted and never replayed to
/// late subscribers. `Added`/`Updated` carry a full item so receivers can
/// patch locally; `Deleted` carries only the id; `MembershipChanged` is a
/// partial signal (the emitter could not construct a correct denormalized
/// item) and receivers are expected to reload instead of patching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// An item was created in `family`.
    Added {
        family: ResourceFamily,
        item: ResourceItem,
    },
    /// An item in `family` was replaced.
    Updated {
        family: ResourceFamily,
        item: ResourceItem,
    },
    /// The item with `id` was removed from `family`.
    Deleted { family: ResourceFamily, id: String },
    /// Something changed membership in `family` from a surface that only
    /// holds a reference, not the resulting item.
    MembershipChanged { family: ResourceFamily },
    /// Server-side bulk metadata reload; every cache should resync.
    ReloadAll,
}

impl ChangeEvent {
    /// The named channel this event is published on.
    pub fn topic(&self) -> String {
        match self {
            ChangeEvent::Added { family, .. } => format!("{family}.resourceAdded"),
            ChangeEvent::Updated { family, .. } => format!("{family}.resourceUpdated"),
            ChangeEvent::Deleted { family, .. } => format!("{family}.resourceDeleted"),
            ChangeEvent::MembershipChanged { family } => format!("{family}.membershipChanged"),
            ChangeEvent::ReloadAll => TOPIC_METADATA_RELOADED.to_string(),
        }
    }

    /// The family this event concerns, if it is family-scoped.
    pub fn family(&self) -> Option<ResourceFamily> {
        match self {
            ChangeEvent::Added { family, .. }
            | ChangeEvent::Updated { family, .. }
            | ChangeEvent::Deleted { family, .. }
            | ChangeEvent::MembershipChanged { family } => Some(*family),
            ChangeEvent::ReloadAll => None,
        }
    }
}

/// The topics a cache for `family` listens on, `metadataReloaded` included.
pub fn family_topics(family: ResourceFamily) -> Vec<String> {
    vec![
        format!("{family}.resourceAdded"),
        format!("{family}.resourceUpdated"),
        format!("{family}.resourceDeleted"),
        format!("{family}.membershipChanged"),
        TOPIC_METADATA_RELOADED.to_string(),
    ]
}
