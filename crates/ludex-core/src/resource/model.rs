//! Resource domain model.
//!
//! A resource item is a denormalized, client-local projection of a server
//! entity. Each of the four resource families is cached independently; no
//! two caches hold the canonical copy of the same family.

use serde::{Deserialize, Serialize};

/// One of the four independently cached resource collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceFamily {
    Games,
    Collections,
    Developers,
    Publishers,
}

impl ResourceFamily {
    /// All families, in startup-load order.
    pub const ALL: [ResourceFamily; 4] = [
        ResourceFamily::Games,
        ResourceFamily::Collections,
        ResourceFamily::Developers,
        ResourceFamily::Publishers,
    ];

    /// The wire/topic name of the family. Doubles as the key wrapping each
    /// family's list-endpoint response body.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceFamily::Games => "games",
            ResourceFamily::Collections => "collections",
            ResourceFamily::Developers => "developers",
            ResourceFamily::Publishers => "publishers",
        }
    }
}

impl std::fmt::Display for ResourceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A denormalized, client-local projection of a server entity.
///
/// The `id` is kept as a string even when the source id is numeric, so
/// equality checks never depend on the server's numeric representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub id: String,
    pub title: String,
    /// Cover image reference, when the family has one.
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Membership count (e.g., games in a collection), when the family has one.
    #[serde(default)]
    pub membership_count: Option<u32>,
    /// Associated tag list, when the family has one.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ResourceItem {
    /// Creates a minimal item with just an id and title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cover_url: None,
            membership_count: None,
            tags: Vec::new(),
        }
    }

    /// The case-insensitive sort key used by every cache.
    pub fn sort_key(&self) -> String {
        self.title.to_lowercase()
    }
}
