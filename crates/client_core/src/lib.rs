//! Catalog browsing core: the HTTP catalog client, the product list and
//! filter state machines, and the persisted favorites set.

pub mod catalog;
pub mod error;
pub mod favorites;
pub mod filters;
pub mod listing;
pub mod session;

pub use catalog::{CatalogApi, HttpCatalogClient, DEFAULT_CATALOG_URL, DEFAULT_REQUEST_TIMEOUT};
pub use error::CatalogError;
pub use favorites::{FavoritesPersistence, FavoritesStore, SlotFavorites, FAVORITES_SLOT};
pub use filters::FilterCoordinator;
pub use listing::{
    FetchOutcome, ListingSnapshot, ProductListController, RequestTag, DEFAULT_PAGE_SIZE,
};
pub use session::{CatalogSession, Theme};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
