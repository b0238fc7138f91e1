//! Persisted client storage backends.

mod atomic_toml;
mod client_storage;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use client_storage::{ClientState, FileClientStorage};
