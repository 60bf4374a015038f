pub mod aggregator;
pub mod engine;
pub mod normalizer;
pub mod partitioner;
pub mod ranker;
pub mod resolver;

pub use crate::domain::model::{
    Market, Offer, OfferListing, OfferStatus, ResultTier, SearchIntent, SearchResult, TierKind,
};
pub use crate::domain::ports::{ConfigProvider, MarketStore};
pub use crate::utils::error::Result;
