use crate::domain::model::SearchIntent;
use crate::utils::error::Result;
use crate::utils::validation::validate_postal_code;

/// 將原始輸入 (q, city, plz) 轉成 SearchIntent，純函式不存取 store
pub fn normalize(
    query: Option<&str>,
    city: Option<&str>,
    postal_code: Option<&str>,
) -> SearchIntent {
    SearchIntent::new(
        query.map(str::to_string),
        city.map(str::to_string),
        postal_code.map(str::to_string),
    )
}

/// Like [`normalize`], but rejects postal codes that are not five digits.
pub fn normalize_strict(
    query: Option<&str>,
    city: Option<&str>,
    postal_code: Option<&str>,
) -> Result<SearchIntent> {
    let intent = normalize(query, city, postal_code);
    if let Some(code) = intent.postal_code.as_deref() {
        validate_postal_code(code)?;
    }
    Ok(intent)
}
