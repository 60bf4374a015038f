use crate::core::aggregator::aggregate;
use crate::core::normalizer::{normalize, normalize_strict};
use crate::core::partitioner::{partition, PartitionedTiers};
use crate::core::ranker::rank;
use crate::core::resolver::LocalityResolver;
use crate::domain::model::{SearchIntent, SearchResult};
use crate::domain::ports::{ConfigProvider, MarketStore};
use crate::utils::error::{DiscoveryError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const DEFAULT_LOOKUP_LIMIT: usize = 30;
pub const MAX_LOOKUP_LIMIT: usize = 50;
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub lookup_limit: usize,
    pub lookup_timeout: Duration,
    pub strict_postal: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            lookup_limit: DEFAULT_LOOKUP_LIMIT,
            lookup_timeout: Duration::from_millis(DEFAULT_LOOKUP_TIMEOUT_MS),
            strict_postal: false,
        }
    }
}

impl EngineOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            lookup_limit: config.lookup_limit().clamp(1, MAX_LOOKUP_LIMIT),
            lookup_timeout: Duration::from_millis(config.lookup_timeout_ms()),
            strict_postal: config.strict_postal(),
        }
    }
}

/// Regional discovery over an injected [`MarketStore`].
///
/// Holds no per-request state; `search` may be called concurrently.
pub struct SearchEngine<S: MarketStore> {
    store: S,
    options: EngineOptions,
}

impl<S: MarketStore> SearchEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    pub fn with_options(store: S, options: EngineOptions) -> Self {
        Self { store, options }
    }

    pub fn from_config<C: ConfigProvider>(store: S, config: &C) -> Self {
        Self::with_options(store, EngineOptions::from_config(config))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 解析原始輸入；嚴格模式下拒絕格式錯誤的郵遞區號
    pub fn intent(
        &self,
        query: Option<&str>,
        city: Option<&str>,
        postal_code: Option<&str>,
    ) -> Result<SearchIntent> {
        if self.options.strict_postal {
            normalize_strict(query, city, postal_code)
        } else {
            Ok(normalize(query, city, postal_code))
        }
    }

    pub async fn search(
        &self,
        query: Option<&str>,
        city: Option<&str>,
        postal_code: Option<&str>,
    ) -> Result<SearchResult> {
        let intent = self.intent(query, city, postal_code)?;
        self.search_intent(&intent, Utc::now()).await
    }

    /// Runs a search with an explicit clock, used for offer expiry checks.
    pub async fn search_intent(
        &self,
        intent: &SearchIntent,
        now: DateTime<Utc>,
    ) -> Result<SearchResult> {
        if !intent.has_criteria() {
            tracing::debug!("No search criteria supplied, returning empty tiers");
            return Ok(aggregate(PartitionedTiers::default(), false, Vec::new()));
        }

        tracing::debug!(
            "🔍 Searching q={:?} city={:?} plz={:?} region={:?}",
            intent.query,
            intent.city,
            intent.postal_code,
            intent.region_prefix
        );

        let resolver = LocalityResolver::new(
            &self.store,
            self.options.lookup_limit,
            self.options.lookup_timeout,
        );
        let candidates = resolver.resolve(intent, now).await;

        if candidates.all_failed() {
            tracing::error!(
                "❌ All {} lookups failed, search is unavailable",
                candidates.attempted.len()
            );
            return Err(DiscoveryError::EngineUnavailable {
                attempted: candidates.attempted.len(),
            });
        }

        let failures = candidates.failures.clone();
        let mut tiers = partition(intent, candidates);
        rank(&mut tiers);
        let result = aggregate(tiers, true, failures);

        tracing::info!(
            "📊 {} results ({} markets, {} offers){}",
            result.total_results,
            result.total_markets,
            result.total_offers,
            if result.is_partial() { ", partial" } else { "" }
        );

        Ok(result)
    }
}
