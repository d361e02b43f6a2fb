//! Closed vocabulary of inventory log actions.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use stockroom_core::DomainError;

/// What caused a quantity change recorded in the inventory log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InventoryAction {
    /// Product was created with its starting quantity.
    Create,
    /// Stock was added.
    Restock,
    /// Stock was removed by a sale.
    Sale,
    /// Product was deleted; delta removes the remaining quantity.
    Delete,
    /// Starting quantity of seeded sample data.
    Initial,
}

impl InventoryAction {
    pub const ALL: [InventoryAction; 5] = [
        InventoryAction::Create,
        InventoryAction::Restock,
        InventoryAction::Sale,
        InventoryAction::Delete,
        InventoryAction::Initial,
    ];

    /// Label persisted in the `inventory_log.action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryAction::Create => "CREATE",
            InventoryAction::Restock => "RESTOCK",
            InventoryAction::Sale => "SALE",
            InventoryAction::Delete => "DELETE",
            InventoryAction::Initial => "INITIAL",
        }
    }
}

impl core::fmt::Display for InventoryAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InventoryAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InventoryAction::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown inventory action: {s}")))
    }
}
