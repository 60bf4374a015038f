//! [`MarketStore`] backed by a PostgREST-style HTTP API.
//!
//! Filters are expressed with PostgREST operators (`eq`, `like`, `ilike`,
//! `gt`, `or`), offers are joined to their market with an `!inner` embed so
//! the store applies the activity filter, and rows are validated into domain
//! structs before they reach the engine.

use crate::domain::model::{LocalityFilter, Market, Offer, OfferListing, OfferStatus, SortHint};
use crate::domain::ports::MarketStore;
use crate::utils::error::{DiscoveryError, Result};
use crate::utils::text::fold;
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

const MARKETS_TABLE: &str = "markets";
const OFFERS_TABLE: &str = "offers";
const OFFER_SELECT: &str = "*,market:markets!inner(*)";

#[derive(Debug, Deserialize)]
struct MarketRow {
    id: i64,
    name: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    postal_code: Option<String>,
    #[serde(default)]
    about: Option<String>,
    is_active: bool,
    #[serde(default)]
    is_premium: Option<bool>,
    created_at: DateTime<Utc>,
}

impl From<MarketRow> for Market {
    fn from(row: MarketRow) -> Self {
        Market {
            id: row.id,
            name: row.name,
            city: row.city.unwrap_or_default(),
            postal_code: row.postal_code,
            about: row.about,
            is_active: row.is_active,
            is_premium: row.is_premium.unwrap_or(false),
            created_at: row.created_at,
        }
        .sanitized()
    }
}

#[derive(Debug, Deserialize)]
struct OfferRow {
    id: i64,
    market_id: i64,
    product_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: serde_json::Value,
    status: OfferStatus,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    market: Option<MarketRow>,
}

impl TryFrom<OfferRow> for OfferListing {
    type Error = DiscoveryError;

    fn try_from(row: OfferRow) -> Result<Self> {
        let market = row.market.ok_or_else(|| DiscoveryError::InvalidRowError {
            message: format!("offer {} has no embedded market", row.id),
        })?;

        Ok(OfferListing {
            offer: Offer {
                id: row.id,
                market_id: row.market_id,
                product_name: row.product_name,
                description: row.description,
                price: display_price(&row.price),
                status: row.status,
                expires_at: row.expires_at,
                created_at: row.created_at,
            },
            market: market.into(),
        })
    }
}

/// 價格只做顯示用途，數字或字串都轉成字串
fn display_price(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Folds user text into a LIKE pattern body that matches it literally.
fn like_literal(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len());
    for c in fold(raw).chars() {
        match c {
            '\\' | '%' | '_' => {
                pattern.push('\\');
                pattern.push(c);
            }
            // PostgREST 會把 * 換成 %，沒有跳脫方式，改用單字元萬用字元
            '*' => pattern.push('_'),
            _ => pattern.push(c),
        }
    }
    pattern
}

/// Double-quotes a value so `,` `(` `)` inside an `or=(...)` list stay literal.
fn quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn order_clause(order: SortHint) -> &'static str {
    match order {
        SortHint::PremiumThenNewest => "is_premium.desc,created_at.desc",
        SortHint::Newest => "created_at.desc",
    }
}

fn offer_order_clause(order: SortHint) -> &'static str {
    match order {
        SortHint::PremiumThenNewest => "market(is_premium).desc,created_at.desc",
        SortHint::Newest => "created_at.desc",
    }
}

fn locality_params(locality: &LocalityFilter, column_prefix: &str) -> Vec<(String, String)> {
    match locality {
        LocalityFilter::Anywhere => Vec::new(),
        LocalityFilter::PostalPrefix(prefix) => vec![(
            format!("{}postal_code", column_prefix),
            format!("like.{}*", like_literal(prefix)),
        )],
        LocalityFilter::City(city) => vec![(
            format!("{}city", column_prefix),
            format!("ilike.*{}*", like_literal(city)),
        )],
    }
}

#[derive(Debug, Clone)]
pub struct RestStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        Self::with_client(base_url, api_key, Client::new())
    }

    pub fn with_client(base_url: &str, api_key: Option<String>, client: Client) -> Result<Self> {
        validate_url("store.endpoint", base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn table_url(&self, table: &str, params: &[(String, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, table)).map_err(|e| {
            DiscoveryError::ConfigError {
                message: format!("Invalid store URL: {}", e),
            }
        })?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: &str,
        params: Vec<(String, String)>,
    ) -> Result<Vec<T>> {
        let url = self.table_url(table, &params)?;
        tracing::debug!("Making store request to: {}", url);

        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Store response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::StoreUnavailable {
                lookup: table.to_string(),
                message: format!("HTTP {}: {}", status, body.trim()),
            });
        }

        Ok(response.json::<Vec<T>>().await?)
    }

    async fn fetch_markets(
        &self,
        mut params: Vec<(String, String)>,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        params.insert(0, ("select".to_string(), "*".to_string()));
        params.push(("is_active".to_string(), "eq.true".to_string()));
        params.push(("order".to_string(), order_clause(order).to_string()));
        params.push(("limit".to_string(), limit.to_string()));

        let rows: Vec<MarketRow> = self.fetch(MARKETS_TABLE, params).await?;
        Ok(rows.into_iter().map(Market::from).collect())
    }
}

#[async_trait]
impl MarketStore for RestStore {
    async fn markets_by_postal_prefix(
        &self,
        prefix: &str,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        let params = locality_params(&LocalityFilter::PostalPrefix(prefix.to_string()), "");
        self.fetch_markets(params, limit, order).await
    }

    async fn markets_by_city(
        &self,
        city: &str,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        let params = locality_params(&LocalityFilter::City(city.to_string()), "");
        self.fetch_markets(params, limit, order).await
    }

    async fn markets_by_name(
        &self,
        name: &str,
        locality: &LocalityFilter,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        let mut params = vec![("name".to_string(), format!("ilike.*{}*", like_literal(name)))];
        params.extend(locality_params(locality, ""));
        self.fetch_markets(params, limit, order).await
    }

    async fn offers_by_text(
        &self,
        text: &str,
        locality: &LocalityFilter,
        now: DateTime<Utc>,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<OfferListing>> {
        if fold(text).is_empty() {
            return Ok(Vec::new());
        }
        let needle = quoted(&format!("*{}*", like_literal(text)));

        let mut params = vec![
            ("select".to_string(), OFFER_SELECT.to_string()),
            ("status".to_string(), "eq.live".to_string()),
            (
                "expires_at".to_string(),
                format!("gt.{}", now.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ),
            ("market.is_active".to_string(), "eq.true".to_string()),
            (
                "or".to_string(),
                format!("(product_name.ilike.{0},description.ilike.{0})", needle),
            ),
        ];
        params.extend(locality_params(locality, "market."));
        params.push(("order".to_string(), offer_order_clause(order).to_string()));
        params.push(("limit".to_string(), limit.to_string()));

        let rows: Vec<OfferRow> = self.fetch(OFFERS_TABLE, params).await?;
        let mut listings = Vec::with_capacity(rows.len());
        for row in rows {
            match OfferListing::try_from(row) {
                Ok(listing) => listings.push(listing),
                Err(e) => tracing::warn!("Skipping offer row: {}", e),
            }
        }
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_literal_escapes_wildcards() {
        assert_eq!(like_literal("  Frankfurt (Oder) "), "frankfurt (oder)");
        assert_eq!(like_literal("100%"), "100\\%");
        assert_eq!(like_literal("bio_markt"), "bio\\_markt");
        assert_eq!(like_literal("a\\b"), "a\\\\b");
        assert_eq!(like_literal("Oliven*"), "oliven_");
    }

    #[test]
    fn test_quoted_escapes_quotes_and_backslashes() {
        assert_eq!(quoted("*oliven, grün*"), "\"*oliven, grün*\"");
        assert_eq!(quoted("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quoted("100\\%"), "\"100\\\\%\"");
    }

    #[test]
    fn test_display_price() {
        assert_eq!(display_price(&serde_json::json!("3,20 €")), "3,20 €");
        assert_eq!(display_price(&serde_json::json!(4.5)), "4.5");
        assert_eq!(display_price(&serde_json::Value::Null), "");
    }

    #[test]
    fn test_locality_params() {
        assert!(locality_params(&LocalityFilter::Anywhere, "").is_empty());
        assert_eq!(
            locality_params(&LocalityFilter::PostalPrefix("60".into()), "market."),
            vec![("market.postal_code".to_string(), "like.60*".to_string())]
        );
        assert_eq!(
            locality_params(&LocalityFilter::City("Frankfurt".into()), ""),
            vec![("city".to_string(), "ilike.*frankfurt*".to_string())]
        );
        assert_eq!(
            locality_params(&LocalityFilter::City("Frankfurt (Oder)".into()), ""),
            vec![("city".to_string(), "ilike.*frankfurt (oder)*".to_string())]
        );
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        assert!(RestStore::new("not a url", None).is_err());
        assert!(RestStore::new("https://db.example.com/rest/v1/", None).is_ok());
    }
}
