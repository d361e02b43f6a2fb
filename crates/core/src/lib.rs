//! `stockroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! row identifiers, the exact-decimal [`Price`], and the shared error model.

pub mod error;
pub mod id;
pub mod price;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, LogEntryId, ProductId};
pub use price::Price;
