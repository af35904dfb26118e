use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(ProductId);

/// Zero-based page index. There is no upper bound; a page past the end of the
/// catalog simply comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(u32);

impl PageCursor {
    pub const FIRST: PageCursor = PageCursor(0);

    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Floored at zero.
    pub fn previous(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    pub fn is_first(self) -> bool {
        self.0 == 0
    }

    /// Offset of the first item on this page for the given page size.
    pub fn skip(self, limit: u32) -> u64 {
        u64::from(self.0) * u64::from(limit)
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategorySlug(String);

impl CategorySlug {
    /// Returns `None` for an empty (or whitespace-only) selection.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub thumbnail: String,
    /// Remaining fields returned by the catalog service, kept so a stored
    /// favorite is the full snapshot the service sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: CategorySlug,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteToggle {
    Added,
    Removed,
}

/// Favorited products keyed by id, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Product>", into = "Vec<Product>")]
pub struct FavoriteSet {
    products: Vec<Product>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.products.iter().any(|product| product.id == id)
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn as_slice(&self) -> &[Product] {
        &self.products
    }

    /// Returns `false` and leaves the set untouched if the id is already present.
    pub fn insert(&mut self, product: Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        self.products.push(product);
        true
    }

    pub fn remove(&mut self, id: ProductId) -> Option<Product> {
        let position = self.products.iter().position(|product| product.id == id)?;
        Some(self.products.remove(position))
    }

    pub fn toggle(&mut self, product: Product) -> FavoriteToggle {
        if self.remove(product.id).is_some() {
            FavoriteToggle::Removed
        } else {
            self.products.push(product);
            FavoriteToggle::Added
        }
    }
}

impl From<Vec<Product>> for FavoriteSet {
    fn from(products: Vec<Product>) -> Self {
        let mut set = FavoriteSet::new();
        for product in products {
            set.insert(product);
        }
        set
    }
}

impl From<FavoriteSet> for Vec<Product> {
    fn from(set: FavoriteSet) -> Self {
        set.products
    }
}

/// What the product list is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewQuery {
    Listing { page: PageCursor },
    Search { query: String },
    Category { slug: CategorySlug },
}

impl ViewQuery {
    pub fn is_listing(&self) -> bool {
        matches!(self, ViewQuery::Listing { .. })
    }
}

impl fmt::Display for ViewQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewQuery::Listing { page } => write!(f, "listing(page={page})"),
            ViewQuery::Search { query } => write!(f, "search(q={query:?})"),
            ViewQuery::Category { slug } => write!(f, "category({slug})"),
        }
    }
}

/// Last recorded search text and category selection. Only the most recently
/// invoked one drives the product list; neither clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: Option<String>,
    pub category: Option<CategorySlug>,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
