use crate::core::resolver::RawCandidates;
use crate::domain::model::{LocalityFilter, Market, ResultTier, SearchIntent, TierKind};
use crate::utils::text::equals_folded;
use std::collections::HashSet;

/// Markets and offers live in separate id namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum EntityKey {
    Market(i64),
    Offer(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Exact,
    Region,
    Outside,
}

/// The four tiers before ranking and counting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionedTiers {
    pub exact_locality: ResultTier,
    pub expanded_region: ResultTier,
    pub name_match: ResultTier,
    pub detached_offers: ResultTier,
}

impl Default for PartitionedTiers {
    fn default() -> Self {
        Self {
            exact_locality: ResultTier::empty(TierKind::ExactLocality),
            expanded_region: ResultTier::empty(TierKind::ExpandedRegion),
            name_match: ResultTier::empty(TierKind::NameMatch),
            detached_offers: ResultTier::empty(TierKind::DetachedOffers),
        }
    }
}

impl PartitionedTiers {
    pub fn tiers_mut(&mut self) -> [&mut ResultTier; 4] {
        [
            &mut self.exact_locality,
            &mut self.expanded_region,
            &mut self.name_match,
            &mut self.detached_offers,
        ]
    }

    fn locality_tier(&mut self, placement: Placement) -> Option<&mut ResultTier> {
        match placement {
            Placement::Exact => Some(&mut self.exact_locality),
            Placement::Region => Some(&mut self.expanded_region),
            Placement::Outside => None,
        }
    }
}

/// 依據市場所在地判斷屬於哪一層
fn classify(intent: &SearchIntent, market: &Market) -> Placement {
    if let Some(code) = intent.postal_code.as_deref() {
        return match market.postal_code.as_deref() {
            Some(postal) if postal == code => Placement::Exact,
            Some(postal)
                if intent
                    .postal_match_prefix()
                    .is_some_and(|prefix| postal.starts_with(prefix)) =>
            {
                Placement::Region
            }
            _ => Placement::Outside,
        };
    }

    match intent.city.as_deref() {
        Some(city) if equals_folded(&market.city, city) => Placement::Exact,
        _ => Placement::Outside,
    }
}

/// Splits raw candidates into mutually exclusive tiers.
///
/// Priority is exact locality, expanded region, name match, detached offers;
/// the first tier an entity qualifies for wins and later occurrences are
/// dropped. Within a tier, entries keep store return order with lookups
/// concatenated postal, city, name, text.
///
/// Offers only become detached when no locality was given. With a postal
/// code or city, an offer whose market lies outside that locality is
/// dropped.
pub fn partition(intent: &SearchIntent, candidates: RawCandidates) -> PartitionedTiers {
    let mut tiers = PartitionedTiers::default();
    let mut placed: HashSet<EntityKey> = HashSet::new();
    let scoped = intent.locality() != LocalityFilter::Anywhere;
    let mut out_of_scope = 0usize;

    let RawCandidates {
        by_postal,
        by_city,
        by_name,
        offers,
        ..
    } = candidates;

    for market in by_postal.into_iter().chain(by_city) {
        if placed.contains(&EntityKey::Market(market.id)) {
            continue;
        }
        // 只有城市子字串相符的市場不進入地區層，留給名稱比對
        if let Some(tier) = tiers.locality_tier(classify(intent, &market)) {
            placed.insert(EntityKey::Market(market.id));
            tier.markets.push(market);
        }
    }

    for market in by_name {
        if !placed.insert(EntityKey::Market(market.id)) {
            continue;
        }
        let placement = classify(intent, &market);
        match tiers.locality_tier(placement) {
            Some(tier) => tier.markets.push(market),
            None => tiers.name_match.markets.push(market),
        }
    }

    for listing in offers {
        if !placed.insert(EntityKey::Offer(listing.offer.id)) {
            continue;
        }
        let placement = classify(intent, &listing.market);
        match tiers.locality_tier(placement) {
            Some(tier) => tier.offers.push(listing),
            None if scoped => out_of_scope += 1,
            None => tiers.detached_offers.offers.push(listing),
        }
    }

    tracing::debug!(
        "🧩 Partitioned: exact={} region={} name={} detached={} out_of_scope={}",
        tiers.exact_locality.markets.len() + tiers.exact_locality.offers.len(),
        tiers.expanded_region.markets.len() + tiers.expanded_region.offers.len(),
        tiers.name_match.markets.len(),
        tiers.detached_offers.offers.len(),
        out_of_scope
    );

    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Offer, OfferListing, OfferStatus};
    use chrono::{TimeZone, Utc};

    fn market(id: i64, city: &str, postal: Option<&str>) -> Market {
        Market {
            id,
            name: format!("Markt {}", id),
            city: city.to_string(),
            postal_code: postal.map(str::to_string),
            about: None,
            is_active: true,
            is_premium: false,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn listing(id: i64, market: Market) -> OfferListing {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        OfferListing {
            offer: Offer {
                id,
                market_id: market.id,
                product_name: "Oliven".to_string(),
                description: None,
                price: "3 €".to_string(),
                status: OfferStatus::Live,
                expires_at: now + chrono::Duration::days(7),
                created_at: now,
            },
            market,
        }
    }

    fn market_ids(tier: &ResultTier) -> Vec<i64> {
        tier.markets.iter().map(|m| m.id).collect()
    }

    fn offer_ids(tier: &ResultTier) -> Vec<i64> {
        tier.offers.iter().map(|l| l.offer.id).collect()
    }

    #[test]
    fn test_postal_candidates_split_into_exact_and_region() {
        let intent = SearchIntent::new(None, None, Some("60311".into()));
        let candidates = RawCandidates {
            by_postal: vec![
                market(1, "Frankfurt", Some("60311")),
                market(2, "Frankfurt", Some("60200")),
                market(3, "Frankfurt", Some("60311")),
            ],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(market_ids(&tiers.exact_locality), vec![1, 3]);
        assert_eq!(market_ids(&tiers.expanded_region), vec![2]);
        assert!(tiers.name_match.is_empty());
    }

    #[test]
    fn test_name_match_excludes_markets_already_placed() {
        let intent = SearchIntent::new(Some("Markt".into()), None, Some("60311".into()));
        let local = market(1, "Frankfurt", Some("60311"));
        let candidates = RawCandidates {
            by_postal: vec![local.clone()],
            by_name: vec![local, market(4, "Offenbach", Some("63065"))],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(market_ids(&tiers.exact_locality), vec![1]);
        assert_eq!(market_ids(&tiers.name_match), vec![4]);
    }

    #[test]
    fn test_name_lookup_market_with_exact_postal_lands_in_exact_tier() {
        let intent = SearchIntent::new(Some("Markt".into()), None, Some("60311".into()));
        let candidates = RawCandidates {
            by_name: vec![market(5, "Frankfurt", Some("60311"))],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(market_ids(&tiers.exact_locality), vec![5]);
        assert!(tiers.name_match.is_empty());
    }

    #[test]
    fn test_city_equality_decides_exact_tier() {
        let intent = SearchIntent::new(None, Some("frankfurt".into()), None);
        let candidates = RawCandidates {
            by_city: vec![
                market(1, "Frankfurt", None),
                market(2, "Frankfurt (Oder)", Some("15230")),
            ],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(market_ids(&tiers.exact_locality), vec![1]);
        assert!(tiers.expanded_region.is_empty());
    }

    #[test]
    fn test_offers_follow_their_market_locality() {
        let intent = SearchIntent::new(Some("Oliven".into()), None, Some("60311".into()));
        let candidates = RawCandidates {
            offers: vec![
                listing(10, market(1, "Frankfurt", Some("60311"))),
                listing(11, market(2, "Frankfurt", Some("60200"))),
                listing(12, market(3, "Kassel", Some("34117"))),
            ],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(offer_ids(&tiers.exact_locality), vec![10]);
        assert_eq!(offer_ids(&tiers.expanded_region), vec![11]);
        // 有指定地區時，區外的商品不會變成 detached
        assert!(tiers.detached_offers.is_empty());
    }

    #[test]
    fn test_offers_outside_city_are_dropped() {
        let intent = SearchIntent::new(Some("Honig".into()), Some("Frankfurt".into()), None);
        let candidates = RawCandidates {
            offers: vec![
                listing(20, market(1, "Frankfurt", Some("60311"))),
                listing(21, market(2, "Frankfurt (Oder)", Some("15230"))),
            ],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(offer_ids(&tiers.exact_locality), vec![20]);
        assert!(tiers.detached_offers.is_empty());
        assert!(tiers.name_match.is_empty());
    }

    #[test]
    fn test_offers_without_locality_are_detached() {
        let intent = SearchIntent::new(Some("Oliven".into()), None, None);
        let candidates = RawCandidates {
            offers: vec![
                listing(30, market(1, "Frankfurt", Some("60311"))),
                listing(31, market(2, "Kassel", Some("34117"))),
            ],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(offer_ids(&tiers.detached_offers), vec![30, 31]);
    }

    #[test]
    fn test_city_substring_market_found_by_name_is_a_name_match() {
        let intent = SearchIntent::new(Some("Hof".into()), Some("Frankfurt".into()), None);
        let oder = market(2, "Frankfurt (Oder)", Some("15230"));
        let candidates = RawCandidates {
            by_city: vec![market(1, "Frankfurt", None), oder.clone()],
            by_name: vec![oder],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(market_ids(&tiers.exact_locality), vec![1]);
        assert_eq!(market_ids(&tiers.name_match), vec![2]);
    }

    #[test]
    fn test_market_and_offer_ids_do_not_collide() {
        let intent = SearchIntent::new(Some("Oliven".into()), None, None);
        let seller = market(7, "Berlin", Some("10115"));
        let candidates = RawCandidates {
            by_name: vec![seller.clone()],
            offers: vec![listing(7, seller.clone()), listing(7, seller)],
            ..Default::default()
        };

        let tiers = partition(&intent, candidates);
        assert_eq!(market_ids(&tiers.name_match), vec![7]);
        assert_eq!(offer_ids(&tiers.detached_offers), vec![7]);
    }

    #[test]
    fn test_no_candidates_yield_empty_tiers() {
        let tiers = partition(&SearchIntent::default(), RawCandidates::default());
        assert_eq!(tiers, PartitionedTiers::default());
    }
}
