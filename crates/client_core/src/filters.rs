use std::sync::Arc;

use shared::domain::{Category, CategorySlug, FilterState, ViewQuery};
use tokio::sync::Mutex;

use crate::{
    error::CatalogError,
    listing::{FetchOutcome, ProductListController},
};

/// Search text and category selection. Each one replaces the product list on
/// its own; the last one invoked wins and neither clears the other.
pub struct FilterCoordinator {
    list: Arc<ProductListController>,
    state: Mutex<FilterState>,
}

impl FilterCoordinator {
    pub fn new(list: Arc<ProductListController>) -> Self {
        Self {
            list,
            state: Mutex::new(FilterState::default()),
        }
    }

    pub async fn filter_state(&self) -> FilterState {
        self.state.lock().await.clone()
    }

    /// An empty query restores the current unfiltered page. Otherwise the
    /// search results replace the list regardless of the page cursor.
    pub async fn search(&self, query: &str) -> Result<FetchOutcome, CatalogError> {
        let query = query.trim();
        self.state.lock().await.search = (!query.is_empty()).then(|| query.to_string());

        if query.is_empty() {
            return Ok(self.list.reload().await);
        }
        self.list
            .show(ViewQuery::Search {
                query: query.to_string(),
            })
            .await
    }

    /// An empty selection restores the current unfiltered page. Otherwise the
    /// full category result set replaces the list.
    pub async fn filter_by_category(&self, selection: &str) -> Result<FetchOutcome, CatalogError> {
        let slug = CategorySlug::parse(selection);
        self.state.lock().await.category = slug.clone();

        match slug {
            None => Ok(self.list.reload().await),
            Some(slug) => self.list.show(ViewQuery::Category { slug }).await,
        }
    }

    /// Options for the category selector.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.list.api().categories().await
    }
}

#[cfg(test)]
#[path = "tests/filters_tests.rs"]
mod tests;
