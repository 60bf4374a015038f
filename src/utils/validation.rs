use crate::utils::error::{DiscoveryError, Result};
use url::Url;

pub const POSTAL_CODE_LEN: usize = 5;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    let invalid = |reason: String| DiscoveryError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: url_str.to_string(),
        reason,
    };

    let url = Url::parse(url_str).map_err(|e| invalid(format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(format!("Unsupported URL scheme: {}", scheme))),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(DiscoveryError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| DiscoveryError::MissingConfigError {
            field: field_name.to_string(),
        })
}

/// 郵遞區號必須剛好是 5 位 ASCII 數字
pub fn is_valid_postal_code(value: &str) -> bool {
    value.len() == POSTAL_CODE_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_postal_code(value: &str) -> Result<()> {
    if is_valid_postal_code(value) {
        Ok(())
    } else {
        Err(DiscoveryError::InvalidPostalCode {
            value: value.to_string(),
            reason: format!("expected exactly {} ASCII digits", POSTAL_CODE_LEN),
        })
    }
}
