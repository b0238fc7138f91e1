//! API client and unauthorized interceptor.
//!
//! Every outbound call to the system's own API base goes through
//! [`ApiClient::execute`], which is also where the rejected-credential
//! interception lives: a 401 from any endpoint other than the session
//! probe invokes the registered handler, once per qualifying response.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use ludex_core::error::{LudexError, Result};

/// Header carrying the OAuth client identifier alongside non-override
/// credentials.
pub const CLIENT_ID_HEADER: &str = "Client-ID";

/// Timeout applied to the identity probe; it must be abortable rather than
/// hang the startup credential sweep.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Callback invoked when the server rejects the active credential.
///
/// Registered once at bootstrap by the session controller; invocations must
/// be idempotent because every qualifying 401 retriggers it.
#[async_trait]
pub trait UnauthorizedHandler: Send + Sync {
    async fn on_unauthorized(&self);
}

/// HTTP client bound to the deployment's API base URL.
pub struct ApiClient {
    http: Client,
    base_url: String,
    unauthorized_handler: RwLock<Option<Arc<dyn UnauthorizedHandler>>>,
}

impl ApiClient {
    /// Creates a client for the API at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| LudexError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            unauthorized_handler: RwLock::new(None),
        })
    }

    /// The deployment base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Registers the rejected-credential handler, replacing any previous one.
    pub fn set_unauthorized_handler(&self, handler: Arc<dyn UnauthorizedHandler>) {
        *self
            .unauthorized_handler
            .write()
            .expect("unauthorized handler lock poisoned") = Some(handler);
    }

    /// Builds an absolute URL for `path` under the API base.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Sends the request and applies the unauthorized interception.
    ///
    /// `probe` marks the session-probe endpoint itself: its 401 legitimately
    /// reports credential invalidity and must not retrigger invalidation.
    /// Non-2xx statuses become [`LudexError::Api`].
    pub(crate) async fn execute(&self, request: RequestBuilder, probe: bool) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| LudexError::network(e.to_string()))?;

        let status = response.status();
        if should_notify_unauthorized(status, probe) {
            self.notify_unauthorized().await;
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LudexError::api(status.as_u16(), error_message(&body)));
        }

        Ok(response)
    }

    /// Invokes the registered handler, if any, for one qualifying response.
    pub(crate) async fn notify_unauthorized(&self) {
        let handler = self
            .unauthorized_handler
            .read()
            .expect("unauthorized handler lock poisoned")
            .clone();

        match handler {
            Some(handler) => handler.on_unauthorized().await,
            None => tracing::warn!("credential rejected but no unauthorized handler registered"),
        }
    }
}

/// The interception decision: a rejected-credential status on anything but
/// the session probe.
pub(crate) fn should_notify_unauthorized(status: StatusCode, probe: bool) -> bool {
    status == StatusCode::UNAUTHORIZED && !probe
}

/// Extracts a human-readable message from an error body, falling back to
/// the raw text.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.or(parsed.error) {
            return message;
        }
    }

    if body.is_empty() {
        "request failed".to_string()
    } else {
        body.chars().take(200).collect()
    }
}
