use crate::core::partitioner::PartitionedTiers;
use crate::domain::model::{Market, OfferListing, ResultTier};
use std::cmp::Ordering;

/// Premium markets first, then newest first.
pub fn compare_markets(a: &Market, b: &Market) -> Ordering {
    b.is_premium
        .cmp(&a.is_premium)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Offers carry no premium flag; newest first.
pub fn compare_offers(a: &OfferListing, b: &OfferListing) -> Ordering {
    b.offer.created_at.cmp(&a.offer.created_at)
}

/// `sort_by` is stable, so equal keys keep store return order.
pub fn rank_tier(tier: &mut ResultTier) {
    tier.markets.sort_by(compare_markets);
    tier.offers.sort_by(compare_offers);
}

pub fn rank(tiers: &mut PartitionedTiers) {
    for tier in tiers.tiers_mut() {
        rank_tier(tier);
    }
}
