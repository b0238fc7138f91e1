//! Ludex API layer: the HTTP implementations of the core gateway traits.
//!
//! [`ApiClient`] is the single chokepoint for calls to the system's own API
//! base; the unauthorized interception lives inside it. The `auth` and
//! `resources` modules implement `ludex_core::gateway::{AuthGateway,
//! ResourceGateway}` for it.

mod auth;
mod client;
mod dto;
mod resources;

pub use client::{ApiClient, CLIENT_ID_HEADER, PROBE_TIMEOUT, UnauthorizedHandler};
