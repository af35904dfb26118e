use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{Category, CategorySlug, Product, ProductId},
    protocol::{CategoryEntry, ProductListResponse},
};
use tracing::debug;
use url::Url;

use crate::error::CatalogError;

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Read-only access to the external product catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_products(
        &self,
        limit: u32,
        skip: u64,
    ) -> Result<ProductListResponse, CatalogError>;
    /// Search is not paginated; the service decides how many results to return.
    async fn search_products(&self, query: &str) -> Result<ProductListResponse, CatalogError>;
    async fn products_by_category(
        &self,
        slug: &CategorySlug,
    ) -> Result<ProductListResponse, CatalogError>;
    async fn categories(&self) -> Result<Vec<Category>, CatalogError>;
    async fn product(&self, id: ProductId) -> Result<Product, CatalogError>;
}

pub struct HttpCatalogClient {
    http: Client,
    base_url: Url,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str) -> Result<Self, CatalogError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, CatalogError> {
        let parsed =
            Url::parse(base_url).map_err(|_| CatalogError::InvalidBaseUrl(base_url.to_string()))?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CatalogError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let url_label = url.to_string();
        debug!(url = %url_label, ?query, "catalog request");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                url: url_label.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url_label,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| CatalogError::Transport {
                url: url_label.clone(),
                source,
            })?;
        serde_json::from_slice(&body).map_err(|source| CatalogError::Decode {
            url: url_label,
            source,
        })
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
    async fn list_products(
        &self,
        limit: u32,
        skip: u64,
    ) -> Result<ProductListResponse, CatalogError> {
        let url = self.endpoint(&["products"])?;
        self.get_json(
            url,
            &[("limit", limit.to_string()), ("skip", skip.to_string())],
        )
        .await
    }

    async fn search_products(&self, query: &str) -> Result<ProductListResponse, CatalogError> {
        let url = self.endpoint(&["products", "search"])?;
        self.get_json(url, &[("q", query.to_string())]).await
    }

    async fn products_by_category(
        &self,
        slug: &CategorySlug,
    ) -> Result<ProductListResponse, CatalogError> {
        let url = self.endpoint(&["products", "category", slug.as_str()])?;
        self.get_json(url, &[]).await
    }

    async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        let url = self.endpoint(&["products", "categories"])?;
        let entries: Vec<CategoryEntry> = self.get_json(url, &[]).await?;
        Ok(entries
            .into_iter()
            .filter_map(CategoryEntry::into_category)
            .collect())
    }

    async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let id = id.to_string();
        let url = self.endpoint(&["products", id.as_str()])?;
        self.get_json(url, &[]).await
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
