//! Resource domain: the four cached collections and their items.

mod model;

pub use model::{ResourceFamily, ResourceItem};
