//! Nearest-neighbor index and its persistent store.

pub mod flat;
pub mod store;

pub use flat::FlatVectorIndex;
pub use store::{IndexStore, SearchHit};
