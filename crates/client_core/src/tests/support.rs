//! In-process catalog double shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use serde_json::{json, Map};
use shared::{
    domain::{Category, CategorySlug, Product, ProductId},
    protocol::ProductListResponse,
};
use tokio::sync::{oneshot, Mutex};

use crate::{catalog::CatalogApi, error::CatalogError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { limit: u32, skip: u64 },
    Search(String),
    Category(String),
    Categories,
    Product(i64),
}

struct Gate {
    entered: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
pub struct FakeCatalog {
    calls: Mutex<Vec<Call>>,
    listing_gates: Mutex<HashMap<u64, Gate>>,
    search_gate: Mutex<Option<Gate>>,
    pub fail_listing: AtomicBool,
    pub fail_search: AtomicBool,
    pub fail_category: AtomicBool,
}

pub fn product(id: i64, title: &str) -> Product {
    Product {
        id: ProductId(id),
        title: title.to_string(),
        price: 10.0 + id as f64,
        rating: 4.0,
        thumbnail: format!("https://cdn.example/{id}.webp"),
        extra: Map::new(),
    }
}

fn list(products: Vec<Product>) -> ProductListResponse {
    ProductListResponse {
        total: products.len() as u64,
        skip: 0,
        limit: products.len() as u64,
        products,
    }
}

fn server_error(endpoint: &str) -> CatalogError {
    CatalogError::Status {
        url: format!("fake://{endpoint}"),
        status: 500,
    }
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_listing() -> Arc<Self> {
        let catalog = Self::default();
        catalog.fail_listing.store(true, Ordering::SeqCst);
        Arc::new(catalog)
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn listing_calls(&self) -> Vec<(u32, u64)> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                Call::List { limit, skip } => Some((limit, skip)),
                _ => None,
            })
            .collect()
    }

    /// Blocks the next listing request for `skip` until the returned sender
    /// fires. The receiver resolves once that request has been issued.
    pub async fn hold_listing(&self, skip: u64) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.listing_gates.lock().await.insert(
            skip,
            Gate {
                entered: entered_tx,
                release: release_rx,
            },
        );
        (entered_rx, release_tx)
    }

    /// Same as `hold_listing`, for the next search request.
    pub async fn hold_search(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (entered_tx, entered_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.search_gate.lock().await = Some(Gate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_products(
        &self,
        limit: u32,
        skip: u64,
    ) -> Result<ProductListResponse, CatalogError> {
        self.record(Call::List { limit, skip }).await;

        let gate = self.listing_gates.lock().await.remove(&skip);
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.await;
        }

        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(server_error("products"));
        }

        let first = skip as i64 + 1;
        let products = (first..first + i64::from(limit))
            .map(|id| product(id, &format!("Product {id}")))
            .collect();
        Ok(ProductListResponse {
            products,
            total: 194,
            skip,
            limit: u64::from(limit),
        })
    }

    async fn search_products(&self, query: &str) -> Result<ProductListResponse, CatalogError> {
        self.record(Call::Search(query.to_string())).await;

        let gate = self.search_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.await;
        }

        if self.fail_search.load(Ordering::SeqCst) {
            return Err(server_error("products/search"));
        }
        Ok(list(vec![
            product(900, &format!("{query} one")),
            product(901, &format!("{query} two")),
        ]))
    }

    async fn products_by_category(
        &self,
        slug: &CategorySlug,
    ) -> Result<ProductListResponse, CatalogError> {
        self.record(Call::Category(slug.as_str().to_string())).await;
        if self.fail_category.load(Ordering::SeqCst) {
            return Err(server_error("products/category"));
        }
        if slug.as_str() != "smartphones" {
            return Ok(list(Vec::new()));
        }
        let products = (121..=136)
            .map(|id| {
                let mut phone = product(id, &format!("Phone {id}"));
                phone
                    .extra
                    .insert("category".to_string(), json!("smartphones"));
                phone
            })
            .collect();
        Ok(list(products))
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.record(Call::Categories).await;
        Ok(["beauty", "smartphones"]
            .into_iter()
            .filter_map(|raw| {
                Some(Category {
                    slug: CategorySlug::parse(raw)?,
                    name: raw.to_uppercase(),
                    url: format!("fake://products/category/{raw}"),
                })
            })
            .collect())
    }

    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.record(Call::Product(id.0)).await;
        if id.0 == 404 {
            return Err(CatalogError::Status {
                url: "fake://products/404".to_string(),
                status: 404,
            });
        }
        Ok(product(id.0, &format!("Product {}", id.0)))
    }
}
