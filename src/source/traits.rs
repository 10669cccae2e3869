use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// One browsable catalog entry.
///
/// Identity is by `id` only: two records with the same id are the same
/// character regardless of attribute differences, and the later fetch wins
/// on merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub origin: Option<Origin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
}

/// The backend types ids numerically in some schemas; normalize to a string
/// so identity comparison stays uniform across both query paths.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "character id must be a string or number, got {other}"
        ))),
    }
}

/// Filter criteria for a listing. An empty field means unset.
///
/// Equality is structural; any field change is a new criteria value and
/// invalidates the current page sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub name: String,
    pub status: String,
    pub species: String,
    pub gender: String,
}

/// Pagination metadata as returned by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub count: u32,
    pub pages: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterPage {
    pub info: PageInfo,
    pub results: Vec<Character>,
}

#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Fetch one page of the catalog matching `criteria`. Pages are 1-based.
    async fn fetch_page(&self, criteria: &Criteria, page: u32) -> Result<CharacterPage>;

    /// Resolve a single character by id. `Ok(None)` means the id does not
    /// (or no longer does) exist on the backend.
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Character>>;
}
