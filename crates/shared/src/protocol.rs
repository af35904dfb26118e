use serde::{Deserialize, Serialize};

use crate::domain::{Category, CategorySlug, Product};

/// Body of the listing, search and category endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

/// One element of the category-list endpoint. Older service revisions
/// returned bare slugs instead of objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryEntry {
    Detailed(Category),
    Slug(String),
}

impl CategoryEntry {
    pub fn into_category(self) -> Option<Category> {
        match self {
            CategoryEntry::Detailed(category) => Some(category),
            CategoryEntry::Slug(raw) => {
                let slug = CategorySlug::parse(&raw)?;
                Some(Category {
                    name: slug.as_str().to_string(),
                    slug,
                    url: String::new(),
                })
            }
        }
    }
}
