use std::sync::Arc;

use anyhow::{Context, Result};
use shared::domain::{FavoriteToggle, PageCursor, Product, ProductId};

use crate::{
    catalog::CatalogApi,
    error::CatalogError,
    favorites::{FavoritesPersistence, FavoritesStore},
    filters::FilterCoordinator,
    listing::ProductListController,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// One browsing session: product list, filters and favorites over a single
/// catalog.
pub struct CatalogSession {
    api: Arc<dyn CatalogApi>,
    list: Arc<ProductListController>,
    filters: FilterCoordinator,
    favorites: FavoritesStore,
    theme: Theme,
}

impl CatalogSession {
    /// Hydrates favorites, then issues the first listing fetch for `page`.
    pub async fn open(
        api: Arc<dyn CatalogApi>,
        page_size: u32,
        page: PageCursor,
        persistence: Arc<dyn FavoritesPersistence>,
    ) -> Self {
        let favorites = FavoritesStore::hydrate(persistence).await;
        let list = ProductListController::start_at(Arc::clone(&api), page_size, page).await;
        let filters = FilterCoordinator::new(Arc::clone(&list));
        Self {
            api,
            list,
            filters,
            favorites,
            theme: Theme::default(),
        }
    }

    pub fn list(&self) -> &Arc<ProductListController> {
        &self.list
    }

    pub fn filters(&self) -> &FilterCoordinator {
        &self.filters
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Finds a snapshot in the visible list, then in favorites, then asks the
    /// catalog.
    pub async fn lookup_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        if let Some(product) = self
            .list
            .snapshot()
            .await
            .products
            .into_iter()
            .find(|product| product.id == id)
        {
            return Ok(product);
        }
        if let Some(product) = self.favorites.get(id).await {
            return Ok(product);
        }
        self.api.product(id).await
    }

    pub async fn toggle_favorite_by_id(&self, id: ProductId) -> Result<(Product, FavoriteToggle)> {
        let product = self
            .lookup_product(id)
            .await
            .with_context(|| format!("failed to resolve product {id}"))?;
        let outcome = self.favorites.toggle_favorite(product.clone()).await?;
        Ok((product, outcome))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
