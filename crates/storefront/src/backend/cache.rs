//! Cache types for admin API catalog responses.

use little_monsters_core::{Attribute, Category, CategoryId, Product, ProductId};

use super::types::ProductQuery;

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
    Category(CategoryId),
    Categories,
    Attributes(AttributeKind),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
    Attributes(Vec<Attribute>),
}

/// The four attribute collections the catalog can be filtered by.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum AttributeKind {
    Size,
    Age,
    Duration,
    Destination,
}

impl AttributeKind {
    /// Collection path under the API base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Size => "sizes",
            Self::Age => "ages",
            Self::Duration => "durations",
            Self::Destination => "destinations",
        }
    }
}
