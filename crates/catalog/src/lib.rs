//! Client-side tutorial catalog: filter state, the evaluator deriving the
//! visible subset, and the store that owns both for a page view.

mod filter;
mod state;
mod store;

pub use filter::{matches, topic_options, visible};
pub use state::{FilterAction, FilterField, FilterState, UnknownFilterField};
pub use store::CatalogStore;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
