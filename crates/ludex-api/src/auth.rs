//! Authentication endpoints.
//!
//! Implements [`AuthGateway`] on top of [`ApiClient`]: the identity probe,
//! the authorization-start call, and the best-effort logout revocation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ludex_core::error::Result;
use ludex_core::gateway::AuthGateway;
use ludex_core::session::Identity;

use crate::client::{ApiClient, CLIENT_ID_HEADER, PROBE_TIMEOUT};
use crate::dto::string_or_number;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityDto {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(alias = "username")]
    display_name: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl From<IdentityDto> for Identity {
    fn from(dto: IdentityDto) -> Self {
        Identity {
            id: dto.id,
            display_name: dto.display_name,
            avatar_url: dto.avatar_url,
            is_development_identity: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    force_verify: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationResponse {
    auth_url: String,
}

#[async_trait]
impl AuthGateway for ApiClient {
    async fn fetch_identity(
        &self,
        credential: &str,
        client_id: Option<&str>,
    ) -> Result<Identity> {
        let mut request = self
            .get("/auth/me")
            .bearer_auth(credential)
            .timeout(PROBE_TIMEOUT);
        if let Some(client_id) = client_id {
            request = request.header(CLIENT_ID_HEADER, client_id);
        }

        // probe=true: a 401 here legitimately reports invalidity and must
        // not loop back through the unauthorized handler.
        let response = self.execute(request, true).await?;
        let dto: IdentityDto = response.json().await?;
        Ok(dto.into())
    }

    async fn start_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        force_verify: bool,
    ) -> Result<String> {
        let request = self.post("/auth/twitch").json(&AuthorizationRequest {
            client_id,
            client_secret,
            force_verify,
        });

        let response = self.execute(request, false).await?;
        let body: AuthorizationResponse = response.json().await?;
        Ok(body.auth_url)
    }

    async fn revoke(&self, credential: &str) -> Result<()> {
        let request = self.post("/auth/logout").bearer_auth(credential);
        self.execute(request, false).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_dto_with_numeric_id() {
        let dto: IdentityDto = serde_json::from_str(
            r#"{"id": 4217, "displayName": "Player One", "avatarUrl": "https://cdn.example/a.png"}"#,
        )
        .unwrap();

        let identity: Identity = dto.into();
        assert_eq!(identity.id, "4217");
        assert_eq!(identity.display_name, "Player One");
        assert_eq!(
            identity.avatar_url.as_deref(),
            Some("https://cdn.example/a.png")
        );
        assert!(!identity.is_development_identity);
    }

    #[test]
    fn test_identity_dto_username_alias() {
        let dto: IdentityDto =
            serde_json::from_str(r#"{"id": "abc", "username": "alt-name"}"#).unwrap();
        assert_eq!(dto.display_name, "alt-name");
        assert!(dto.avatar_url.is_none());
    }

    #[test]
    fn test_authorization_request_wire_shape() {
        let body = serde_json::to_value(AuthorizationRequest {
            client_id: "cid",
            client_secret: "sec",
            force_verify: true,
        })
        .unwrap();

        assert_eq!(body["clientId"], "cid");
        assert_eq!(body["clientSecret"], "sec");
        assert_eq!(body["forceVerify"], true);
    }

    #[test]
    fn test_authorization_response() {
        let body: AuthorizationResponse =
            serde_json::from_str(r#"{"authUrl": "https://id.twitch.tv/oauth2/authorize?x=1"}"#)
                .unwrap();
        assert!(body.auth_url.starts_with("https://id.twitch.tv"));
    }
}
