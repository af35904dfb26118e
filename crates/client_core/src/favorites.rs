use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::{FavoriteSet, FavoriteToggle, Product, ProductId};
use storage::SlotStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const FAVORITES_SLOT: &str = "favorites";

/// Where the favorites set lives between runs.
#[async_trait]
pub trait FavoritesPersistence: Send + Sync {
    /// Never fails: missing or unreadable data yields an empty set.
    async fn load(&self) -> FavoriteSet;
    async fn save(&self, favorites: &FavoriteSet) -> Result<()>;
}

/// Stores the set as a JSON array of product snapshots in one named slot.
pub struct SlotFavorites<S> {
    store: S,
    slot: String,
}

impl<S: SlotStore> SlotFavorites<S> {
    pub fn new(store: S) -> Self {
        Self::with_slot(store, FAVORITES_SLOT)
    }

    pub fn with_slot(store: S, slot: impl Into<String>) -> Self {
        Self {
            store,
            slot: slot.into(),
        }
    }
}

#[async_trait]
impl<S: SlotStore> FavoritesPersistence for SlotFavorites<S> {
    async fn load(&self) -> FavoriteSet {
        let raw = match self.store.read_slot(&self.slot).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return FavoriteSet::new(),
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "failed to read favorites; starting empty");
                return FavoriteSet::new();
            }
        };

        match serde_json::from_str::<FavoriteSet>(&raw) {
            Ok(favorites) => favorites,
            Err(err) => {
                warn!(slot = %self.slot, error = %err, "stored favorites are malformed; starting empty");
                FavoriteSet::new()
            }
        }
    }

    async fn save(&self, favorites: &FavoriteSet) -> Result<()> {
        let raw = serde_json::to_string(favorites).context("failed to encode favorites")?;
        self.store.write_slot(&self.slot, &raw).await
    }
}

/// In-memory favorites kept in step with persistence. Every toggle rewrites
/// the whole set before it becomes visible.
pub struct FavoritesStore {
    persistence: Arc<dyn FavoritesPersistence>,
    favorites: Mutex<FavoriteSet>,
}

impl FavoritesStore {
    pub async fn hydrate(persistence: Arc<dyn FavoritesPersistence>) -> Self {
        let favorites = persistence.load().await;
        info!(count = favorites.len(), "favorites hydrated");
        Self {
            persistence,
            favorites: Mutex::new(favorites),
        }
    }

    pub async fn toggle_favorite(&self, product: Product) -> Result<FavoriteToggle> {
        let id = product.id;
        // Held across the write so saves land in mutation order.
        let mut favorites = self.favorites.lock().await;
        let mut next = favorites.clone();
        let outcome = next.toggle(product);

        self.persistence
            .save(&next)
            .await
            .with_context(|| format!("failed to persist favorites after toggling product {id}"))?;

        *favorites = next;
        info!(product_id = id.0, ?outcome, count = favorites.len(), "favorite toggled");
        Ok(outcome)
    }

    pub async fn is_favorite(&self, id: ProductId) -> bool {
        self.favorites.lock().await.contains(id)
    }

    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.favorites.lock().await.get(id).cloned()
    }

    pub async fn favorites(&self) -> FavoriteSet {
        self.favorites.lock().await.clone()
    }
}

#[cfg(test)]
#[path = "tests/favorites_tests.rs"]
mod tests;
