//! Ludex core: domain models and seams for the client-side state layer of a
//! personal game-library browser.
//!
//! This crate holds the pieces every other layer agrees on: the session
//! record and its phase machine, the resource item model, the change-event
//! bus, the shared error type, and the traits behind which the HTTP layer
//! (`ludex-api`), the persisted client storage (`ludex-infrastructure`),
//! and the presentation layer plug in.

pub mod error;
pub mod event;
pub mod gateway;
pub mod resource;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::{LudexError, Result};
