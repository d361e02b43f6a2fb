//! Append-only inventory log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{LogEntryId, ProductId};

use crate::action::InventoryAction;
use crate::optional_text;
use crate::product::Product;

pub const NOTE_PRODUCT_CREATED: &str = "Product created";
pub const NOTE_PRODUCT_DELETED: &str = "Product deleted";
pub const NOTE_INITIAL_SETUP: &str = "Initial inventory setup";

/// A persisted inventory log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: LogEntryId,
    pub product_id: ProductId,
    /// Current product name, or the name recorded with the entry once the
    /// product has been deleted.
    pub product_name: String,
    pub action: InventoryAction,
    pub delta: i64,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

/// An entry ready to be appended (id and timestamp are assigned on insert).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub product_id: ProductId,
    pub product_name: String,
    pub action: InventoryAction,
    pub delta: i64,
    pub note: Option<String>,
}

impl NewLogEntry {
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        action: InventoryAction,
        delta: i64,
        note: Option<String>,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            action,
            delta,
            note: optional_text(note),
        }
    }

    /// `CREATE` entry carrying the starting quantity.
    pub fn created(product_id: ProductId, name: &str, quantity: i64) -> Self {
        Self::new(
            product_id,
            name,
            InventoryAction::Create,
            quantity,
            Some(NOTE_PRODUCT_CREATED.to_string()),
        )
    }

    /// `INITIAL` entry for seeded sample data.
    pub fn initial(product_id: ProductId, name: &str, quantity: i64) -> Self {
        Self::new(
            product_id,
            name,
            InventoryAction::Initial,
            quantity,
            Some(NOTE_INITIAL_SETUP.to_string()),
        )
    }

    /// `DELETE` entry removing whatever stock remains.
    pub fn deleted(product: &Product) -> Self {
        Self::new(
            product.id,
            product.name.as_str(),
            InventoryAction::Delete,
            -product.quantity,
            Some(NOTE_PRODUCT_DELETED.to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::Price;

    #[test]
    fn deleted_entry_negates_remaining_quantity() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::from_raw(3),
            name: "Jeans".to_string(),
            description: None,
            price: Price::ZERO,
            quantity: 30,
            category_id: None,
            created_at: now,
            updated_at: now,
        };
        let entry = NewLogEntry::deleted(&product);
        assert_eq!(entry.action, InventoryAction::Delete);
        assert_eq!(entry.delta, -30);
        assert_eq!(entry.note.as_deref(), Some(NOTE_PRODUCT_DELETED));
    }

    #[test]
    fn blank_note_is_dropped() {
        let entry = NewLogEntry::new(
            ProductId::from_raw(1),
            "Rice",
            InventoryAction::Restock,
            10,
            Some("  ".to_string()),
        );
        assert_eq!(entry.note, None);
    }
}
