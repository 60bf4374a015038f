use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Invalid postal code '{value}': {reason}")]
    InvalidPostalCode { value: String, reason: String },

    #[error("Store lookup '{lookup}' failed: {message}")]
    StoreUnavailable { lookup: String, message: String },

    #[error("Store lookup '{lookup}' exceeded {timeout_ms}ms")]
    LookupTimeout { lookup: String, timeout_ms: u64 },

    #[error("Search engine unavailable: all {attempted} lookups failed")]
    EngineUnavailable { attempted: usize },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration field '{field}' is missing")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid store row: {message}")]
    InvalidRowError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Store,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiscoveryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DiscoveryError::InvalidPostalCode { .. } => ErrorCategory::Input,
            DiscoveryError::StoreUnavailable { .. }
            | DiscoveryError::LookupTimeout { .. }
            | DiscoveryError::EngineUnavailable { .. }
            | DiscoveryError::HttpError(_)
            | DiscoveryError::InvalidRowError { .. } => ErrorCategory::Store,
            DiscoveryError::ConfigError { .. }
            | DiscoveryError::MissingConfigError { .. }
            | DiscoveryError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            DiscoveryError::CsvError(_)
            | DiscoveryError::IoError(_)
            | DiscoveryError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一查詢失敗會在引擎內被吸收
            DiscoveryError::StoreUnavailable { .. } | DiscoveryError::LookupTimeout { .. } => {
                ErrorSeverity::Low
            }
            DiscoveryError::EngineUnavailable { .. } | DiscoveryError::HttpError(_) => {
                ErrorSeverity::Medium
            }
            DiscoveryError::InvalidPostalCode { .. }
            | DiscoveryError::ConfigError { .. }
            | DiscoveryError::MissingConfigError { .. }
            | DiscoveryError::InvalidConfigValueError { .. }
            | DiscoveryError::InvalidRowError { .. } => ErrorSeverity::High,
            DiscoveryError::CsvError(_)
            | DiscoveryError::IoError(_)
            | DiscoveryError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Your search input was rejected: {}", self),
            ErrorCategory::Store => format!("The market directory could not be searched: {}", self),
            ErrorCategory::Configuration => format!("The search is misconfigured: {}", self),
            ErrorCategory::System => format!("An internal error occurred: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DiscoveryError::InvalidPostalCode { .. } => {
                "Use a five-digit postal code or disable strict postal mode"
            }
            DiscoveryError::StoreUnavailable { .. }
            | DiscoveryError::LookupTimeout { .. }
            | DiscoveryError::EngineUnavailable { .. }
            | DiscoveryError::HttpError(_) => {
                "Check that the store is reachable and retry, or raise lookup_timeout_ms"
            }
            DiscoveryError::InvalidRowError { .. } => "Inspect the store data for malformed rows",
            DiscoveryError::ConfigError { .. }
            | DiscoveryError::MissingConfigError { .. }
            | DiscoveryError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags"
            }
            DiscoveryError::CsvError(_)
            | DiscoveryError::IoError(_)
            | DiscoveryError::SerializationError(_) => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
