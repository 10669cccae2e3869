// Client-side catalog browsing engine: incremental cancellation-safe
// pagination, bulk favorites resolution, and the persisted stores backing
// the favorites and comments views.

pub mod config;
pub mod engine;
pub mod source;
pub mod store;

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::EngineConfig;
pub use engine::favorites::{FavoritesEngine, FavoritesSnapshot};
pub use engine::listing::{ListingEngine, ListingSnapshot};
pub use source::graphql_source::GraphqlSource;
pub use source::traits::{Character, CharacterPage, CharacterSource, Criteria, PageInfo};
pub use store::{CommentsStore, FavoritesStore, KeyValueStore};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing once for the host application.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        info!("catalog engine tracing initialized");
    });
}
