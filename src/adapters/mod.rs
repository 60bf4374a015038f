// Adapters layer: concrete MarketStore implementations.

pub mod memory;
pub mod rest;

pub use memory::{Fixtures, InMemoryStore};
pub use rest::RestStore;
