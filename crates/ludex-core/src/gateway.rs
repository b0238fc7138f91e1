//! Gateway traits to the excluded API and presentation layers.
//!
//! The session controller and the resource caches never talk to the network
//! or the navigation surface directly; they go through these seams. The
//! HTTP implementations live in `ludex-api`, the real navigator in the
//! presentation layer.

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::{ResourceFamily, ResourceItem};
use crate::session::Identity;

/// Gateway for the authentication endpoints.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Looks up the identity owning `credential` via the session probe.
    ///
    /// `client_id` accompanies non-override credentials; the override
    /// credential is probed without one. Any error (non-2xx or network)
    /// means "not authenticated with this credential".
    async fn fetch_identity(&self, credential: &str, client_id: Option<&str>)
    -> Result<Identity>;

    /// Requests the authorization URL starting a full OAuth redirect flow.
    async fn start_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        force_verify: bool,
    ) -> Result<String>;

    /// Asks the server to revoke `credential`. Best effort; callers ignore
    /// the outcome beyond logging.
    async fn revoke(&self, credential: &str) -> Result<()>;
}

/// Gateway for the per-family list endpoints.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Fetches the full list for `family` using `credential`.
    async fn list(&self, family: ResourceFamily, credential: &str) -> Result<Vec<ResourceItem>>;
}

/// Navigation seam owned by the presentation layer.
///
/// Used for the full-page OAuth redirect and for the hard reset after the
/// server unilaterally revoked the credential.
pub trait Navigator: Send + Sync {
    /// Performs a full navigation to `url`. Fire-and-forget.
    fn redirect(&self, url: &str);
}
