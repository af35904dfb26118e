use thiserror::Error;

/// Why a catalog request failed. These distinctions are only logged; the user
/// sees a single static message for a failed listing.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("catalog request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("catalog responded with status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("malformed catalog response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::Status { status: 404, .. })
    }
}
