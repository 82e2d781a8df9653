use shared::domain::CatalogItem;
use tracing::{debug, warn};

use crate::{
    filter::{topic_options, visible},
    state::{FilterAction, FilterState},
};

/// Fetched catalog plus the learner's filter selections for one page view.
#[derive(Debug, Default)]
pub struct CatalogStore {
    items: Vec<CatalogItem>,
    state: FilterState,
    loading: bool,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Installs the fetch result. A failed fetch leaves an empty catalog.
    pub fn finish_loading(&mut self, result: anyhow::Result<Vec<CatalogItem>>) {
        self.loading = false;
        match result {
            Ok(items) => {
                debug!(count = items.len(), "catalog loaded");
                self.items = items;
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "failed to fetch catalog");
                self.items.clear();
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn dispatch(&mut self, action: FilterAction) {
        self.state = std::mem::take(&mut self.state).apply(action);
    }

    pub fn visible(&self) -> Vec<&CatalogItem> {
        visible(&self.items, &self.state)
    }

    pub fn topic_options(&self) -> Vec<&str> {
        topic_options(&self.items)
    }

    /// Whether the view should show its "no results" message.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.visible().is_empty()
    }
}
