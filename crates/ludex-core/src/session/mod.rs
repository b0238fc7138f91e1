//! Session domain: the authentication record and its phase machine.

mod model;

pub use model::{Identity, Session, SessionPhase};
