use std::{collections::BTreeMap, sync::Arc};

use shared::{
    domain::{PageCursor, Product, ViewQuery},
    error::ViewError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{catalog::CatalogApi, error::CatalogError};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Identifies one issued fetch. A response is applied only while its
/// generation is still the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub generation: u64,
    pub query: ViewQuery,
    superseded: Superseded,
}

/// Target a request replaced, put back when a filter fetch fails so a
/// listing still in flight can land.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Superseded {
    generation: u64,
    requested: ViewQuery,
    loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The request failed; for listings the error is recorded in the view.
    Failed,
    /// A newer request retargeted the view before this one completed. The
    /// response is still applied if that newer request is a failed filter.
    Discarded,
    /// Nothing to fetch, e.g. going back from the first page.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingSnapshot {
    pub page: PageCursor,
    pub limit: u32,
    /// Most recently requested view.
    pub requested: ViewQuery,
    /// View the current `products` came from; `None` until a fetch succeeds.
    pub shown: Option<ViewQuery>,
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<ViewError>,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
enum PageMove {
    Stay,
    Next,
    Previous,
}

struct ListingState {
    page: PageCursor,
    requested: ViewQuery,
    shown: Option<ViewQuery>,
    products: Vec<Product>,
    loading: bool,
    error: Option<ViewError>,
    generation: u64,
    parked: BTreeMap<u64, (RequestTag, Result<Vec<Product>, CatalogError>)>,
}

/// Owns the product list, page cursor and loading/error status.
pub struct ProductListController {
    api: Arc<dyn CatalogApi>,
    limit: u32,
    state: Mutex<ListingState>,
}

impl ProductListController {
    /// Creates the controller and issues the first-page listing fetch.
    pub async fn start(api: Arc<dyn CatalogApi>, limit: u32) -> Arc<Self> {
        Self::start_at(api, limit, PageCursor::FIRST).await
    }

    pub async fn start_at(api: Arc<dyn CatalogApi>, limit: u32, page: PageCursor) -> Arc<Self> {
        let controller = Arc::new(Self::new(api, limit, page));
        controller.reload().await;
        controller
    }

    fn new(api: Arc<dyn CatalogApi>, limit: u32, page: PageCursor) -> Self {
        Self {
            api,
            limit: limit.max(1),
            state: Mutex::new(ListingState {
                page,
                requested: ViewQuery::Listing { page },
                shown: None,
                products: Vec::new(),
                loading: false,
                error: None,
                generation: 0,
                parked: BTreeMap::new(),
            }),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub(crate) fn api(&self) -> &Arc<dyn CatalogApi> {
        &self.api
    }

    pub async fn page(&self) -> PageCursor {
        self.state.lock().await.page
    }

    pub async fn snapshot(&self) -> ListingSnapshot {
        let state = self.state.lock().await;
        ListingSnapshot {
            page: state.page,
            limit: self.limit,
            requested: state.requested.clone(),
            shown: state.shown.clone(),
            products: state.products.clone(),
            loading: state.loading,
            error: state.error.clone(),
            generation: state.generation,
        }
    }

    pub async fn next_page(&self) -> FetchOutcome {
        self.show_listing(PageMove::Next).await
    }

    /// Going back from the first page does nothing.
    pub async fn previous_page(&self) -> FetchOutcome {
        self.show_listing(PageMove::Previous).await
    }

    /// Re-fetches the current page without any filter.
    pub async fn reload(&self) -> FetchOutcome {
        self.show_listing(PageMove::Stay).await
    }

    async fn show_listing(&self, step: PageMove) -> FetchOutcome {
        let tag = {
            let mut state = self.state.lock().await;
            let page = match step {
                PageMove::Stay => state.page,
                PageMove::Next => state.page.next(),
                PageMove::Previous if state.page.is_first() => return FetchOutcome::Unchanged,
                PageMove::Previous => state.page.previous(),
            };
            begin_locked(&mut state, ViewQuery::Listing { page })
        };
        let result = self.fetch(&tag.query).await;
        match self.complete(tag, result).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::Failed,
        }
    }

    /// Retargets the view at `query` and fetches it. Listing failures are
    /// recorded as the view error; filter failures leave the view untouched
    /// and are only returned.
    pub(crate) async fn show(&self, query: ViewQuery) -> Result<FetchOutcome, CatalogError> {
        let tag = begin_locked(&mut *self.state.lock().await, query);
        let result = self.fetch(&tag.query).await;
        self.complete(tag, result).await
    }

    async fn fetch(&self, query: &ViewQuery) -> Result<Vec<Product>, CatalogError> {
        let response = match query {
            ViewQuery::Listing { page } => {
                let skip = page.skip(self.limit);
                info!(page = page.index(), limit = self.limit, skip, "fetching listing");
                self.api.list_products(self.limit, skip).await?
            }
            ViewQuery::Search { query } => {
                info!(query = %query, "fetching search results");
                self.api.search_products(query).await?
            }
            ViewQuery::Category { slug } => {
                info!(category = %slug, "fetching category");
                self.api.products_by_category(slug).await?
            }
        };
        Ok(response.products)
    }

    async fn complete(
        &self,
        tag: RequestTag,
        result: Result<Vec<Product>, CatalogError>,
    ) -> Result<FetchOutcome, CatalogError> {
        let mut state = self.state.lock().await;
        if state.generation != tag.generation {
            debug!(
                generation = tag.generation,
                current = state.generation,
                query = %tag.query,
                ok = result.is_ok(),
                "discarding stale catalog response"
            );
            // Kept in case the newer request fails and hands the view back.
            state.parked.insert(tag.generation, (tag, result));
            return Ok(FetchOutcome::Discarded);
        }
        settle_locked(&mut state, tag, result)
    }
}

/// Applies a current response. A failed filter fetch hands the view back to
/// the request it superseded, settling that one too if it already returned.
fn settle_locked(
    state: &mut ListingState,
    tag: RequestTag,
    result: Result<Vec<Product>, CatalogError>,
) -> Result<FetchOutcome, CatalogError> {
    match result {
        Ok(products) => {
            debug!(query = %tag.query, count = products.len(), "catalog view updated");
            state.loading = false;
            state.products = products;
            state.shown = Some(tag.query);
            state.error = None;
            state.parked.clear();
            Ok(FetchOutcome::Applied)
        }
        Err(err) if tag.query.is_listing() => {
            warn!(query = %tag.query, error = %err, "listing fetch failed");
            state.loading = false;
            state.error = Some(ViewError::listing_fetch_failed());
            state.parked.clear();
            Err(err)
        }
        Err(err) => {
            warn!(query = %tag.query, error = %err, "filter fetch failed; keeping previous products");
            let previous = tag.superseded;
            state.generation = previous.generation;
            state.requested = previous.requested;
            state.loading = previous.loading;
            if let Some((earlier, earlier_result)) = state.parked.remove(&previous.generation) {
                debug!(generation = earlier.generation, "settling superseded response");
                let _ = settle_locked(state, earlier, earlier_result);
            }
            Err(err)
        }
    }
}

fn begin_locked(state: &mut ListingState, query: ViewQuery) -> RequestTag {
    let superseded = Superseded {
        generation: state.generation,
        requested: state.requested.clone(),
        loading: state.loading,
    };
    state.generation += 1;
    if let ViewQuery::Listing { page } = &query {
        state.page = *page;
    }
    state.requested = query.clone();
    state.loading = true;
    RequestTag {
        generation: state.generation,
        query,
        superseded,
    }
}

#[cfg(test)]
#[path = "tests/listing_tests.rs"]
mod tests;
