//! Domain error model.

use thiserror::Error;

use crate::id::{CategoryId, ProductId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Storage failures belong to the store crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. blank name, negative price).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A category with this name already exists.
    #[error("category name already exists: {0}")]
    DuplicateName(String),

    /// The category is still referenced by products.
    #[error("category {category_id} is referenced by {products} product(s)")]
    HasDependents { category_id: CategoryId, products: u64 },

    /// A product write referenced a category that does not exist.
    #[error("category {0} does not exist")]
    InvalidCategory(CategoryId),

    /// A stock adjustment would leave the product below zero.
    #[error("stock cannot go negative (product {product_id}: {current} {delta:+})")]
    NegativeStock {
        product_id: ProductId,
        current: i64,
        delta: i64,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn category_not_found(id: CategoryId) -> Self {
        Self::NotFound {
            entity: "category",
            id: id.get(),
        }
    }

    pub fn product_not_found(id: ProductId) -> Self {
        Self::NotFound {
            entity: "product",
            id: id.get(),
        }
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName(name.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
