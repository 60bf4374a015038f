#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, ResolvedConfig};
pub use toml_config::{SearchConfig, StoreKind, StoreSettings};
