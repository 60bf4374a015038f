use crate::app::report::OutputFormat;
use crate::config::toml_config::{SearchConfig, StoreSettings, MAX_LOOKUP_TIMEOUT_MS};
use crate::core::engine::{EngineOptions, MAX_LOOKUP_LIMIT};
use crate::core::ConfigProvider;
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "market-search")]
#[command(about = "Search markets and offers by text, city or postal code")]
pub struct CliConfig {
    #[arg(long, help = "Free-text query matched against market names and offers")]
    pub q: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    #[arg(long, help = "Postal code (PLZ)")]
    pub plz: Option<String>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "JSON fixtures file for the in-memory store")]
    pub fixtures: Option<String>,

    #[arg(long, help = "Base URL of a PostgREST-compatible store")]
    pub store_url: Option<String>,

    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long, help = "Maximum rows per lookup")]
    pub limit: Option<usize>,

    #[arg(long, help = "Per-lookup deadline in milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(long, help = "Reject postal codes that are not five digits")]
    pub strict_postal: bool,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

/// CLI flags merged over an optional configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub options: EngineOptions,
    pub store: StoreSettings,
    pub verbose: bool,
    pub log_json: bool,
}

impl CliConfig {
    pub fn load_file(&self) -> Result<Option<SearchConfig>> {
        match &self.config {
            Some(path) => {
                let file = SearchConfig::from_file(path)?;
                file.validate()?;
                Ok(Some(file))
            }
            None => Ok(None),
        }
    }

    fn store_settings(&self, file: Option<&SearchConfig>) -> Result<StoreSettings> {
        if let Some(endpoint) = &self.store_url {
            return Ok(StoreSettings::Rest {
                endpoint: endpoint.clone(),
                api_key: self
                    .api_key
                    .clone()
                    .or_else(|| file.and_then(|f| f.store.api_key.clone())),
            });
        }
        if let Some(fixtures) = &self.fixtures {
            return Ok(StoreSettings::Memory {
                fixtures: fixtures.clone(),
            });
        }
        match file {
            Some(file) => file.store.settings(),
            None => Err(DiscoveryError::MissingConfigError {
                field: "--fixtures, --store-url or --config".to_string(),
            }),
        }
    }

    /// 命令列參數優先於設定檔
    pub fn resolve(&self, file: Option<&SearchConfig>) -> Result<ResolvedConfig> {
        self.validate()?;

        let limit = self
            .limit
            .or_else(|| file.map(|f| f.lookup_limit()))
            .unwrap_or_else(|| EngineOptions::default().lookup_limit);
        let timeout_ms = self
            .timeout_ms
            .or_else(|| file.map(|f| f.lookup_timeout_ms()));
        let options = EngineOptions {
            lookup_limit: limit.clamp(1, MAX_LOOKUP_LIMIT),
            lookup_timeout: timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| EngineOptions::default().lookup_timeout),
            strict_postal: self.strict_postal || file.is_some_and(|f| f.strict_postal()),
        };

        Ok(ResolvedConfig {
            options,
            store: self.store_settings(file)?,
            verbose: self.verbose || file.is_some_and(|f| f.verbose()),
            log_json: self.log_json || file.is_some_and(|f| f.json_logs()),
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(limit) = self.limit {
            validate_range("--limit", limit, 1, MAX_LOOKUP_LIMIT)?;
        }
        if let Some(timeout) = self.timeout_ms {
            validate_range("--timeout-ms", timeout, 1, MAX_LOOKUP_TIMEOUT_MS)?;
        }
        if let Some(url) = &self.store_url {
            validate_url("--store-url", url)?;
        }
        if let Some(path) = &self.fixtures {
            validate_path("--fixtures", path)?;
        }
        if let Some(path) = &self.config {
            validate_path("--config", path)?;
        }
        Ok(())
    }
}

impl ConfigProvider for ResolvedConfig {
    fn lookup_limit(&self) -> usize {
        self.options.lookup_limit
    }

    fn lookup_timeout_ms(&self) -> u64 {
        self.options.lookup_timeout.as_millis() as u64
    }

    fn strict_postal(&self) -> bool {
        self.options.strict_postal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["market-search"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&["--q", "Honig", "--fixtures", "markets.json"]);
        let resolved = cli.resolve(None).unwrap();

        assert_eq!(cli.format, OutputFormat::Table);
        assert_eq!(resolved.options, EngineOptions::default());
        assert_eq!(
            resolved.store,
            StoreSettings::Memory {
                fixtures: "markets.json".to_string()
            }
        );
    }

    #[test]
    fn test_cli_flags_override_file() {
        let file = SearchConfig::from_toml_str(
            r#"
[engine]
lookup_limit = 10
lookup_timeout_ms = 900
strict_postal = true

[store]
kind = "rest"
endpoint = "https://db.example.com/rest/v1"
api_key = "file-key"

[logging]
json = true
"#,
        )
        .unwrap();

        let cli = parse(&["--plz", "60311", "--limit", "40", "--format", "json"]);
        let resolved = cli.resolve(Some(&file)).unwrap();

        assert_eq!(resolved.options.lookup_limit, 40);
        assert_eq!(resolved.options.lookup_timeout, Duration::from_millis(900));
        assert!(resolved.options.strict_postal);
        assert!(resolved.log_json);
        assert_eq!(
            resolved.store,
            StoreSettings::Rest {
                endpoint: "https://db.example.com/rest/v1".to_string(),
                api_key: Some("file-key".to_string()),
            }
        );
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_requires_a_store() {
        let cli = parse(&["--city", "Frankfurt"]);
        assert!(matches!(
            cli.resolve(None),
            Err(DiscoveryError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_cli_validation() {
        assert!(parse(&["--limit", "0", "--fixtures", "m.json"]).resolve(None).is_err());
        assert!(parse(&["--store-url", "ftp://x"]).resolve(None).is_err());
    }
}
