use std::collections::{BTreeSet, HashSet};

use shared::domain::CatalogItem;

use crate::state::FilterState;

/// Items passing every active predicate, in their original order.
pub fn visible<'a>(items: &'a [CatalogItem], state: &FilterState) -> Vec<&'a CatalogItem> {
    let needle = state.search_term.to_lowercase();
    items
        .iter()
        .filter(|item| passes(item, state, &needle))
        .collect()
}

/// Single-item form of [`visible`].
pub fn matches(item: &CatalogItem, state: &FilterState) -> bool {
    passes(item, state, &state.search_term.to_lowercase())
}

fn passes(item: &CatalogItem, state: &FilterState, needle: &str) -> bool {
    matches_search(item, needle)
        && in_selection(&state.topic, item.topic.as_deref())
        && in_selection(&state.difficulty, item.difficulty.map(|d| d.as_str()))
        && in_selection(&state.length, item.length_category.map(|l| l.as_str()))
}

fn matches_search(item: &CatalogItem, needle: &str) -> bool {
    needle.is_empty()
        || item.title.to_lowercase().contains(needle)
        || item.description.to_lowercase().contains(needle)
}

fn in_selection(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    selected.is_empty() || selected.contains(value.unwrap_or_default())
}

/// Distinct non-empty topics in first-seen order, for rendering topic
/// toggles.
pub fn topic_options(items: &[CatalogItem]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| item.topic.as_deref())
        .filter(|topic| !topic.is_empty() && seen.insert(*topic))
        .collect()
}
