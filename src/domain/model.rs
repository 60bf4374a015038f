use crate::utils::text::{char_prefix, non_empty};
use crate::utils::validation::is_valid_postal_code;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Postal codes are grouped into regions by this many leading characters.
pub const REGION_PREFIX_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub id: i64,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
}

impl Market {
    /// 在 store 邊界驗證：格式錯誤的郵遞區號視為缺失
    pub fn sanitized(mut self) -> Self {
        if let Some(code) = self.postal_code.take() {
            let code = code.trim().to_string();
            if is_valid_postal_code(&code) {
                self.postal_code = Some(code);
            } else if !code.is_empty() {
                tracing::warn!(
                    "Market {} has malformed postal code '{}', treating it as absent",
                    self.id,
                    code
                );
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Draft,
    Live,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: i64,
    pub market_id: i64,
    pub product_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
    pub status: OfferStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        self.status == OfferStatus::Live && self.expires_at > now
    }
}

/// An offer joined with the market it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferListing {
    pub offer: Offer,
    pub market: Market,
}

impl OfferListing {
    pub fn is_searchable_at(&self, now: DateTime<Utc>) -> bool {
        self.market.is_active && self.offer.is_visible_at(now)
    }
}

/// Canonical, per-request search input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    pub query: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub region_prefix: Option<String>,
}

impl SearchIntent {
    pub fn new(query: Option<String>, city: Option<String>, postal_code: Option<String>) -> Self {
        let query = non_empty(query.as_deref());
        let city = non_empty(city.as_deref());
        let postal_code = non_empty(postal_code.as_deref());
        let region_prefix = postal_code
            .as_deref()
            .filter(|code| code.chars().count() >= REGION_PREFIX_LEN)
            .map(|code| char_prefix(code, REGION_PREFIX_LEN).to_string());

        Self {
            query,
            city,
            postal_code,
            region_prefix,
        }
    }

    pub fn has_criteria(&self) -> bool {
        self.query.is_some() || self.city.is_some() || self.postal_code.is_some()
    }

    /// Prefix used for postal lookups. Falls back to the raw postal code when
    /// it is too short to carry a region prefix.
    pub fn postal_match_prefix(&self) -> Option<&str> {
        self.region_prefix
            .as_deref()
            .or(self.postal_code.as_deref())
    }

    /// Locality applied to name and text lookups. Postal code wins over city.
    pub fn locality(&self) -> LocalityFilter {
        match self.postal_match_prefix() {
            Some(prefix) => LocalityFilter::PostalPrefix(prefix.to_string()),
            None => match &self.city {
                Some(city) => LocalityFilter::City(city.clone()),
                None => LocalityFilter::Anywhere,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalityFilter {
    Anywhere,
    PostalPrefix(String),
    City(String),
}

/// Ordering the store is asked to return rows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortHint {
    PremiumThenNewest,
    Newest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TierKind {
    ExactLocality,
    ExpandedRegion,
    NameMatch,
    DetachedOffers,
}

impl TierKind {
    pub const ALL: [TierKind; 4] = [
        TierKind::ExactLocality,
        TierKind::ExpandedRegion,
        TierKind::NameMatch,
        TierKind::DetachedOffers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TierKind::ExactLocality => "exact_locality",
            TierKind::ExpandedRegion => "expanded_region",
            TierKind::NameMatch => "name_match",
            TierKind::DetachedOffers => "detached_offers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultTier {
    pub kind: TierKind,
    pub markets: Vec<Market>,
    pub offers: Vec<OfferListing>,
    pub count: usize,
}

impl ResultTier {
    pub fn empty(kind: TierKind) -> Self {
        Self {
            kind,
            markets: Vec::new(),
            offers: Vec::new(),
            count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty() && self.offers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LookupKind {
    MarketsByPostal,
    MarketsByCity,
    MarketsByName,
    OffersByText,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LookupKind::MarketsByPostal => "markets_by_postal",
            LookupKind::MarketsByCity => "markets_by_city",
            LookupKind::MarketsByName => "markets_by_name",
            LookupKind::OffersByText => "offers_by_text",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupFailure {
    pub lookup: LookupKind,
    pub reason: String,
}

/// Final response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub exact_locality: ResultTier,
    pub expanded_region: ResultTier,
    pub name_match: ResultTier,
    pub detached_offers: ResultTier,
    pub total_markets: usize,
    pub total_offers: usize,
    pub total_results: usize,
    pub has_results: bool,
    pub criteria_supplied: bool,
    pub failed_lookups: Vec<LookupFailure>,
}

impl SearchResult {
    pub fn tiers(&self) -> [&ResultTier; 4] {
        [
            &self.exact_locality,
            &self.expanded_region,
            &self.name_match,
            &self.detached_offers,
        ]
    }

    pub fn tier(&self, kind: TierKind) -> &ResultTier {
        match kind {
            TierKind::ExactLocality => &self.exact_locality,
            TierKind::ExpandedRegion => &self.expanded_region,
            TierKind::NameMatch => &self.name_match,
            TierKind::DetachedOffers => &self.detached_offers,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.failed_lookups.is_empty()
    }
}
