use crate::domain::model::{LookupFailure, LookupKind, Market, OfferListing, SearchIntent, SortHint};
use crate::domain::ports::MarketStore;
use crate::utils::error::{DiscoveryError, Result};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

/// Raw, possibly overlapping lookup results in store return order.
#[derive(Debug, Clone, Default)]
pub struct RawCandidates {
    pub by_postal: Vec<Market>,
    pub by_city: Vec<Market>,
    pub by_name: Vec<Market>,
    pub offers: Vec<OfferListing>,
    pub attempted: Vec<LookupKind>,
    pub failures: Vec<LookupFailure>,
}

impl RawCandidates {
    /// True when at least one lookup ran and every one of them failed.
    pub fn all_failed(&self) -> bool {
        !self.attempted.is_empty() && self.failures.len() == self.attempted.len()
    }
}

enum LookupOutcome<T> {
    Skipped,
    Rows(Vec<T>),
    Failed(LookupFailure),
}

impl<T> LookupOutcome<T> {
    fn collect(self, kind: LookupKind, candidates: &mut RawCandidates) -> Vec<T> {
        match self {
            LookupOutcome::Skipped => Vec::new(),
            LookupOutcome::Rows(rows) => {
                candidates.attempted.push(kind);
                rows
            }
            LookupOutcome::Failed(failure) => {
                candidates.attempted.push(kind);
                candidates.failures.push(failure);
                Vec::new()
            }
        }
    }
}

/// Runs one lookup under a deadline. Errors and timeouts become a
/// `Failed` outcome instead of propagating.
async fn guarded<T, F>(kind: LookupKind, deadline: Duration, lookup: Option<F>) -> LookupOutcome<T>
where
    F: Future<Output = Result<Vec<T>>>,
{
    let Some(lookup) = lookup else {
        return LookupOutcome::Skipped;
    };

    let error = match tokio::time::timeout(deadline, lookup).await {
        Ok(Ok(rows)) => {
            tracing::debug!("🔎 {} returned {} rows", kind, rows.len());
            return LookupOutcome::Rows(rows);
        }
        Ok(Err(e)) => DiscoveryError::StoreUnavailable {
            lookup: kind.to_string(),
            message: e.to_string(),
        },
        Err(_) => DiscoveryError::LookupTimeout {
            lookup: kind.to_string(),
            timeout_ms: deadline.as_millis() as u64,
        },
    };

    tracing::warn!("⚠️ {} degraded to an empty result: {}", kind, error);
    LookupOutcome::Failed(LookupFailure {
        lookup: kind,
        reason: error.to_string(),
    })
}

pub struct LocalityResolver<'a, S: MarketStore> {
    store: &'a S,
    limit: usize,
    deadline: Duration,
}

impl<'a, S: MarketStore> LocalityResolver<'a, S> {
    pub fn new(store: &'a S, limit: usize, deadline: Duration) -> Self {
        Self {
            store,
            limit,
            deadline,
        }
    }

    /// 同時發出最多四個查詢，全部完成 (或失敗) 後才回傳
    pub async fn resolve(&self, intent: &SearchIntent, now: DateTime<Utc>) -> RawCandidates {
        let locality = intent.locality();
        let limit = self.limit;

        let postal = intent.postal_match_prefix().map(|prefix| {
            self.store
                .markets_by_postal_prefix(prefix, limit, SortHint::PremiumThenNewest)
        });
        let city = match (&intent.postal_code, &intent.city) {
            (None, Some(city)) => Some(self.store.markets_by_city(
                city,
                limit,
                SortHint::PremiumThenNewest,
            )),
            _ => None,
        };
        let name = intent.query.as_deref().map(|query| {
            self.store
                .markets_by_name(query, &locality, limit, SortHint::PremiumThenNewest)
        });
        let offers = intent.query.as_deref().map(|query| {
            self.store
                .offers_by_text(query, &locality, now, limit, SortHint::Newest)
        });

        let (postal, city, name, offers) = tokio::join!(
            guarded(LookupKind::MarketsByPostal, self.deadline, postal),
            guarded(LookupKind::MarketsByCity, self.deadline, city),
            guarded(LookupKind::MarketsByName, self.deadline, name),
            guarded(LookupKind::OffersByText, self.deadline, offers),
        );

        let mut candidates = RawCandidates::default();
        let by_postal = postal.collect(LookupKind::MarketsByPostal, &mut candidates);
        let by_city = city.collect(LookupKind::MarketsByCity, &mut candidates);
        let by_name = name.collect(LookupKind::MarketsByName, &mut candidates);
        let mut listings = offers.collect(LookupKind::OffersByText, &mut candidates);

        candidates.by_postal = self.active_markets(by_postal);
        candidates.by_city = self.active_markets(by_city);
        candidates.by_name = self.active_markets(by_name);
        // store 不支援 join 時，在這裡補上市場啟用與上架狀態的過濾
        listings.retain(|listing| listing.is_searchable_at(now));
        listings.truncate(limit);
        candidates.offers = listings;

        candidates
    }

    fn active_markets(&self, mut markets: Vec<Market>) -> Vec<Market> {
        markets.retain(|market| market.is_active);
        markets.truncate(self.limit);
        markets
    }
}
