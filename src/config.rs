use serde::Deserialize;

/// Number of results requested per page query.
pub const PAGE_SIZE: u32 = 15;

/// Storage key holding the persisted favorites id array.
pub const FAVORITES_KEY: &str = "favorites";

/// Storage key holding the persisted comment records.
pub const COMMENTS_KEY: &str = "comments";

/// Top-level configuration for the catalog engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// GraphQL endpoint queried by the source.
    pub endpoint: String,
    /// Number of results requested per page.
    pub page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3001/graphql".to_string(),
            page_size: PAGE_SIZE,
        }
    }
}
