use crate::core::engine::{DEFAULT_LOOKUP_LIMIT, DEFAULT_LOOKUP_TIMEOUT_MS, MAX_LOOKUP_LIMIT};
use crate::core::ConfigProvider;
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::validation::{
    validate_path, validate_range, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_LOOKUP_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub engine: EngineSection,
    pub store: StoreSection,
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    pub lookup_limit: Option<usize>,
    pub lookup_timeout_ms: Option<u64>,
    pub strict_postal: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    pub kind: StoreKind,
    pub fixtures: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

/// Where the engine reads markets and offers from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Memory { fixtures: String },
    Rest { endpoint: String, api_key: Option<String> },
}

impl StoreSection {
    pub fn settings(&self) -> Result<StoreSettings> {
        match self.kind {
            StoreKind::Memory => {
                let fixtures = validate_required_field("store.fixtures", &self.fixtures)?;
                validate_path("store.fixtures", fixtures)?;
                Ok(StoreSettings::Memory {
                    fixtures: fixtures.clone(),
                })
            }
            StoreKind::Rest => {
                let endpoint = validate_required_field("store.endpoint", &self.endpoint)?;
                validate_url("store.endpoint", endpoint)?;
                Ok(StoreSettings::Rest {
                    endpoint: endpoint.clone(),
                    api_key: self.api_key.clone().filter(|key| !key.trim().is_empty()),
                })
            }
        }
    }
}

impl SearchConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiscoveryError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiscoveryError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MARKET_STORE_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DiscoveryError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(limit) = self.engine.lookup_limit {
            validate_range("engine.lookup_limit", limit, 1, MAX_LOOKUP_LIMIT)?;
        }
        if let Some(timeout) = self.engine.lookup_timeout_ms {
            validate_range("engine.lookup_timeout_ms", timeout, 1, MAX_LOOKUP_TIMEOUT_MS)?;
        }
        self.store.settings()?;
        Ok(())
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl ConfigProvider for SearchConfig {
    fn lookup_limit(&self) -> usize {
        self.engine.lookup_limit.unwrap_or(DEFAULT_LOOKUP_LIMIT)
    }

    fn lookup_timeout_ms(&self) -> u64 {
        self.engine
            .lookup_timeout_ms
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_MS)
    }

    fn strict_postal(&self) -> bool {
        self.engine.strict_postal.unwrap_or(false)
    }
}

impl Validate for SearchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
