pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, ResolvedConfig};

pub use adapters::{InMemoryStore, RestStore};
pub use app::report::{render, OutputFormat};
pub use config::{SearchConfig, StoreSettings};
pub use self::core::engine::{EngineOptions, SearchEngine};
pub use domain::model::{SearchIntent, SearchResult, TierKind};
pub use domain::ports::MarketStore;
pub use utils::error::{DiscoveryError, Result};
