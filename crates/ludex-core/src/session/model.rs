//! Session domain model.
//!
//! This module contains the single process-wide authentication record and
//! its phase state machine. Exactly one [`Session`] exists per running
//! client; it is written only by the session controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle phase of the client's authentication state.
///
/// ```text
///   Checking ──┬──→ Authenticated
///              ├──→ DevOverride
///              └──→ Unauthenticated
/// ```
///
/// `Checking` only exists during the startup credential sweep; a logout or a
/// rejected-credential signal resets any phase back to `Unauthenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Credential sources are being inspected and validated.
    Checking,
    /// No usable credential remains.
    Unauthenticated,
    /// The configured development override credential is active.
    DevOverride,
    /// A server-validated OAuth credential is active.
    Authenticated,
}

impl SessionPhase {
    /// True when a credential is established (override or regular).
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::DevOverride | Self::Authenticated)
    }
}

/// The identity record returned by the identity probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identity id (string-comparable even when numeric at the source).
    pub id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Avatar image URL, when the server provides one.
    pub avatar_url: Option<String>,
    /// True for the synthesized development-override identity.
    #[serde(default)]
    pub is_development_identity: bool,
}

impl Identity {
    /// The placeholder identity used when the override credential could not
    /// be validated against the server (e.g., the server is unreachable).
    pub fn development_placeholder() -> Self {
        Self {
            id: "dev".to_string(),
            display_name: "Developer".to_string(),
            avatar_url: None,
            is_development_identity: true,
        }
    }
}

/// The single process-wide authentication record.
///
/// Invariant: `identity` and `credential` are `Some` if and only if
/// `phase` is `DevOverride` or `Authenticated`. All mutation goes through
/// the helpers below so the invariant cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated identity, `None` when unauthenticated.
    pub identity: Option<Identity>,
    /// Opaque bearer credential, `None` when unauthenticated.
    pub credential: Option<String>,
    /// Current lifecycle phase.
    pub phase: SessionPhase,
    /// When the current credential was established.
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates the startup session in the `Checking` phase.
    pub fn checking() -> Self {
        Self {
            identity: None,
            credential: None,
            phase: SessionPhase::Checking,
            authenticated_at: None,
        }
    }

    /// Creates an unauthenticated session.
    pub fn unauthenticated() -> Self {
        Self {
            identity: None,
            credential: None,
            phase: SessionPhase::Unauthenticated,
            authenticated_at: None,
        }
    }

    /// Establishes an authenticated (or dev-override) session.
    pub fn establish(&mut self, identity: Identity, credential: String, phase: SessionPhase) {
        debug_assert!(phase.is_authenticated());
        self.identity = Some(identity);
        self.credential = Some(credential);
        self.phase = phase;
        self.authenticated_at = Some(Utc::now());
    }

    /// Resets to the unauthenticated state, clearing identity and credential.
    pub fn reset(&mut self) {
        self.identity = None;
        self.credential = None;
        self.phase = SessionPhase::Unauthenticated;
        self.authenticated_at = None;
    }

    /// True when a credential is established.
    pub fn is_authenticated(&self) -> bool {
        self.phase.is_authenticated()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::unauthenticated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establish_holds_invariant() {
        let mut session = Session::checking();
        session.establish(
            Identity::development_placeholder(),
            "override-token".to_string(),
            SessionPhase::DevOverride,
        );

        assert!(session.is_authenticated());
        assert!(session.identity.is_some());
        assert!(session.credential.is_some());
        assert!(session.authenticated_at.is_some());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::checking();
        session.establish(
            Identity {
                id: "42".to_string(),
                display_name: "Player One".to_string(),
                avatar_url: None,
                is_development_identity: false,
            },
            "token".to_string(),
            SessionPhase::Authenticated,
        );
        session.reset();

        assert_eq!(session.phase, SessionPhase::Unauthenticated);
        assert!(session.identity.is_none());
        assert!(session.credential.is_none());
        assert!(session.authenticated_at.is_none());
    }
}
