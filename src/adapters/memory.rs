use crate::core::ranker::compare_markets;
use crate::domain::model::{LocalityFilter, Market, Offer, OfferListing, SortHint};
use crate::domain::ports::MarketStore;
use crate::utils::error::Result;
use crate::utils::text::{contains_folded, fold};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// On-disk fixture format: `{ "markets": [...], "offers": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub markets: Vec<Market>,
    #[serde(default)]
    pub offers: Vec<Offer>,
}

/// A [`MarketStore`] over plain vectors. Rows come back in insertion order
/// before the sort hint is applied, which keeps results deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    markets: Vec<Market>,
    offers: Vec<Offer>,
    market_index: HashMap<i64, usize>,
}

impl InMemoryStore {
    pub fn new(markets: Vec<Market>, offers: Vec<Offer>) -> Self {
        let markets: Vec<Market> = markets.into_iter().map(Market::sanitized).collect();
        let market_index = markets
            .iter()
            .enumerate()
            .map(|(idx, market)| (market.id, idx))
            .collect();

        Self {
            markets,
            offers,
            market_index,
        }
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self::new(fixtures.markets, fixtures.offers)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let fixtures: Fixtures = serde_json::from_str(content)?;
        Ok(Self::from_fixtures(fixtures))
    }

    /// 從 JSON 檔案載入測試資料
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json_str(&content)?;
        tracing::debug!(
            "Loaded {} markets and {} offers from fixtures",
            store.markets.len(),
            store.offers.len()
        );
        Ok(store)
    }

    pub fn market_count(&self) -> usize {
        self.markets.len()
    }

    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    fn market(&self, id: i64) -> Option<&Market> {
        self.market_index.get(&id).map(|&idx| &self.markets[idx])
    }

    fn select_markets<F>(&self, predicate: F, limit: usize, order: SortHint) -> Vec<Market>
    where
        F: Fn(&Market) -> bool,
    {
        let mut rows: Vec<Market> = self
            .markets
            .iter()
            .filter(|market| market.is_active && predicate(market))
            .cloned()
            .collect();
        sort_markets(&mut rows, order);
        rows.truncate(limit);
        rows
    }
}

fn sort_markets(rows: &mut [Market], order: SortHint) {
    match order {
        SortHint::PremiumThenNewest => rows.sort_by(compare_markets),
        SortHint::Newest => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

fn postal_starts_with(market: &Market, prefix: &str) -> bool {
    market
        .postal_code
        .as_deref()
        .is_some_and(|code| code.starts_with(prefix.trim()))
}

fn within_locality(market: &Market, locality: &LocalityFilter) -> bool {
    match locality {
        LocalityFilter::Anywhere => true,
        LocalityFilter::PostalPrefix(prefix) => postal_starts_with(market, prefix),
        LocalityFilter::City(city) => contains_folded(&market.city, city),
    }
}

fn offer_mentions(offer: &Offer, needle: &str) -> bool {
    contains_folded(&offer.product_name, needle)
        || offer
            .description
            .as_deref()
            .is_some_and(|description| contains_folded(description, needle))
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn markets_by_postal_prefix(
        &self,
        prefix: &str,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        Ok(self.select_markets(|market| postal_starts_with(market, prefix), limit, order))
    }

    async fn markets_by_city(
        &self,
        city: &str,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        Ok(self.select_markets(|market| contains_folded(&market.city, city), limit, order))
    }

    async fn markets_by_name(
        &self,
        name: &str,
        locality: &LocalityFilter,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>> {
        Ok(self.select_markets(
            |market| contains_folded(&market.name, name) && within_locality(market, locality),
            limit,
            order,
        ))
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

        let mut rows: Vec<OfferListing> = self
            .offers
            .iter()
            .filter(|offer| offer.is_visible_at(now) && offer_mentions(offer, text))
            .filter_map(|offer| {
                let market = self.market(offer.market_id)?;
                (market.is_active && within_locality(market, locality)).then(|| OfferListing {
                    offer: offer.clone(),
                    market: market.clone(),
                })
            })
            .collect();

        match order {
            SortHint::Newest => rows.sort_by(|a, b| b.offer.created_at.cmp(&a.offer.created_at)),
            SortHint::PremiumThenNewest => rows.sort_by(|a, b| {
                b.market
                    .is_premium
                    .cmp(&a.market.is_premium)
                    .then_with(|| b.offer.created_at.cmp(&a.offer.created_at))
            }),
        }
        rows.truncate(limit);
        Ok(rows)
    }
}
