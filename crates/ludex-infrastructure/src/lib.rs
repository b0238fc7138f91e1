//! Ludex infrastructure: persisted client storage and path management.

pub mod memory_storage;
pub mod paths;
pub mod storage;

pub use crate::memory_storage::MemoryClientStorage;
pub use crate::storage::{ClientState, FileClientStorage};
