use crate::core::partitioner::PartitionedTiers;
use crate::domain::model::{LookupFailure, ResultTier, SearchResult};

fn counted(mut tier: ResultTier) -> ResultTier {
    tier.count = tier.markets.len() + tier.offers.len();
    tier
}

/// Folds ranked tiers into the response shape.
pub fn aggregate(
    tiers: PartitionedTiers,
    criteria_supplied: bool,
    failed_lookups: Vec<LookupFailure>,
) -> SearchResult {
    let PartitionedTiers {
        exact_locality,
        expanded_region,
        name_match,
        detached_offers,
    } = tiers;

    let exact_locality = counted(exact_locality);
    let expanded_region = counted(expanded_region);
    let name_match = counted(name_match);
    let detached_offers = counted(detached_offers);

    let all = [&exact_locality, &expanded_region, &name_match, &detached_offers];
    let total_markets: usize = all.iter().map(|tier| tier.markets.len()).sum();
    let total_offers: usize = all.iter().map(|tier| tier.offers.len()).sum();
    let total_results = total_markets + total_offers;

    SearchResult {
        exact_locality,
        expanded_region,
        name_match,
        detached_offers,
        total_markets,
        total_offers,
        total_results,
        has_results: total_results > 0,
        criteria_supplied,
        failed_lookups,
    }
}
