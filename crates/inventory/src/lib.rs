//! Inventory domain module.
//!
//! This crate contains business rules for categories, products and the stock
//! ledger, implemented purely as deterministic domain logic (no IO, no storage).
//! The store crate persists these types and calls into the rules here before
//! committing anything.

pub mod action;
pub mod category;
pub mod log;
pub mod product;
pub mod stock;

pub use action::InventoryAction;
pub use category::{Category, CategoryPatch, NewCategory};
pub use log::{
    LogEntry, NOTE_INITIAL_SETUP, NOTE_PRODUCT_CREATED, NOTE_PRODUCT_DELETED, NewLogEntry,
};
pub use product::{NewProduct, Product, ProductPatch, ProductView, UNCATEGORIZED};
pub use stock::{Discrepancy, StockLevel};

use stockroom_core::{DomainError, DomainResult};

/// Trim a required text field, rejecting blank input.
pub(crate) fn required_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
