use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const LISTING_FETCH_FAILED_MESSAGE: &str = "Failed to fetch products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ListingFetchFailed,
}

/// The only failure shown to the user. It replaces the whole product view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ViewError {
    pub code: ErrorCode,
    pub message: String,
}

impl ViewError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn listing_fetch_failed() -> Self {
        Self::new(ErrorCode::ListingFetchFailed, LISTING_FETCH_FAILED_MESSAGE)
    }
}
