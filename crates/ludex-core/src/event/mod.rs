//! Cross-component change notifications.

mod bus;
mod change;

pub use bus::{EventBus, Subscription};
pub use change::{ChangeEvent, TOPIC_METADATA_RELOADED, family_topics};
