//! Resource list endpoints.
//!
//! Implements [`ResourceGateway`] on top of [`ApiClient`]. Each family has
//! one list endpoint returning `{"<family>": [items...]}`; the
//! family-specific shapes are folded into the denormalized
//! [`ResourceItem`] projection here.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use ludex_core::error::{LudexError, Result};
use ludex_core::gateway::ResourceGateway;
use ludex_core::resource::{ResourceFamily, ResourceItem};

use crate::client::ApiClient;
use crate::dto::string_or_number;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceItemDto {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(alias = "name")]
    title: String,
    #[serde(default, alias = "cover")]
    cover_url: Option<String>,
    #[serde(default, alias = "gamesCount")]
    membership_count: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
}

impl From<ResourceItemDto> for ResourceItem {
    fn from(dto: ResourceItemDto) -> Self {
        ResourceItem {
            id: dto.id,
            title: dto.title,
            cover_url: dto.cover_url,
            membership_count: dto.membership_count,
            tags: dto.tags,
        }
    }
}

/// The list endpoint wraps its items under the family name.
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(flatten)]
    families: HashMap<String, Vec<ResourceItemDto>>,
}

impl ListEnvelope {
    fn into_items(mut self, family: ResourceFamily) -> Result<Vec<ResourceItem>> {
        let dtos = self
            .families
            .remove(family.as_str())
            .ok_or_else(|| LudexError::internal(format!("list response missing '{family}' key")))?;
        Ok(dtos.into_iter().map(ResourceItem::from).collect())
    }
}

#[async_trait]
impl ResourceGateway for ApiClient {
    async fn list(&self, family: ResourceFamily, credential: &str) -> Result<Vec<ResourceItem>> {
        let request = self
            .get(&format!("/{}", family.as_str()))
            .bearer_auth(credential);

        let response = self.execute(request, false).await?;
        let envelope: ListEnvelope = response.json().await?;
        envelope.into_items(family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_extracts_family_items() {
        let envelope: ListEnvelope = serde_json::from_str(
            r#"{"developers": [
                {"id": 7, "name": "Nova Games", "gamesCount": 3},
                {"id": "8", "title": "Moon Studio", "tags": ["indie"]}
            ]}"#,
        )
        .unwrap();

        let items = envelope.into_items(ResourceFamily::Developers).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "7");
        assert_eq!(items[0].title, "Nova Games");
        assert_eq!(items[0].membership_count, Some(3));
        assert_eq!(items[1].id, "8");
        assert_eq!(items[1].tags, vec!["indie".to_string()]);
    }

    #[test]
    fn test_envelope_missing_family_key_is_an_error() {
        let envelope: ListEnvelope = serde_json::from_str(r#"{"games": []}"#).unwrap();
        let result = envelope.into_items(ResourceFamily::Publishers);
        assert!(result.is_err());
    }

    #[test]
    fn test_item_optional_fields_default() {
        let envelope: ListEnvelope =
            serde_json::from_str(r#"{"games": [{"id": 1, "title": "Hades"}]}"#).unwrap();
        let items = envelope.into_items(ResourceFamily::Games).unwrap();
        assert!(items[0].cover_url.is_none());
        assert!(items[0].membership_count.is_none());
        assert!(items[0].tags.is_empty());
    }
}
