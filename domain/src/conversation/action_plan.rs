//! Action plan value objects

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// One checklist entry of an action plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl ActionItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Structured summary artifact: a title plus a checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub title: String,
    pub items: Vec<ActionItem>,
}

impl ActionPlan {
    /// Build a plan from item texts, assigning ids `item-1`, `item-2`, ...
    pub fn from_texts(title: impl Into<String>, texts: impl IntoIterator<Item = String>) -> Self {
        let items = texts
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .enumerate()
            .map(|(i, text)| ActionItem::new(format!("item-{}", i + 1), text.trim()))
            .collect();
        Self {
            title: title.into(),
            items,
        }
    }

    /// Flip the completion flag of an item, returning the new value
    pub fn toggle(&mut self, item_id: &str) -> Result<bool, DomainError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| DomainError::ActionItemNotFound(item_id.to_string()))?;
        item.completed = !item.completed;
        Ok(item.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.completed).count()
    }
}
