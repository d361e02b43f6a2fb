//! Product categories.

use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainResult};

use crate::{optional_text, required_text};

/// A persisted category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }

    /// Trim fields and reject a blank name.
    pub fn normalized(self) -> DomainResult<Self> {
        Ok(Self {
            name: required_text("category name", &self.name)?,
            description: optional_text(self.description),
        })
    }
}

/// Partial update of a category: `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl CategoryPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Merge the patch onto the current record.
    ///
    /// A supplied blank description clears it; a supplied blank name is
    /// rejected.
    pub fn apply_to(&self, current: &Category) -> DomainResult<Category> {
        let name = match &self.name {
            Some(name) => required_text("category name", name)?,
            None => current.name.clone(),
        };
        let description = match &self.description {
            Some(description) => optional_text(Some(description.clone())),
            None => current.description.clone(),
        };
        Ok(Category {
            id: current.id,
            name,
            description,
        })
    }
}
