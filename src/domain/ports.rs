use crate::domain::model::{LocalityFilter, Market, OfferListing, SortHint};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only access to the market directory.
///
/// Every lookup returns only active markets (and, for offers, live offers that
/// have not expired at `now`), at most `limit` rows, in `order`.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Markets whose postal code starts with `prefix`.
    async fn markets_by_postal_prefix(
        &self,
        prefix: &str,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>>;

    /// Markets whose city contains `city`, case-insensitively.
    async fn markets_by_city(&self, city: &str, limit: usize, order: SortHint)
        -> Result<Vec<Market>>;

    /// Markets whose name contains `name`, restricted to `locality`.
    async fn markets_by_name(
        &self,
        name: &str,
        locality: &LocalityFilter,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<Market>>;

    /// Offers whose product name or description contains `text`, restricted to
    /// the owning market's `locality`.
    async fn offers_by_text(
        &self,
        text: &str,
        locality: &LocalityFilter,
        now: DateTime<Utc>,
        limit: usize,
        order: SortHint,
    ) -> Result<Vec<OfferListing>>;
}

pub trait ConfigProvider: Send + Sync {
    fn lookup_limit(&self) -> usize;
    fn lookup_timeout_ms(&self) -> u64;
    fn strict_postal(&self) -> bool;
}
