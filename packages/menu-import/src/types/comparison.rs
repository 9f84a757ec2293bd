//! Comparison types - the reviewable change-set produced by the diff engine.

use serde::{Deserialize, Serialize};

use super::menu::{ExtractedCategory, ExtractedItem, ExtractedMenuData, ExtractedOptionGroup};

/// What applying an extracted entity would do to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    /// No trusted match; a new entity would be inserted
    Create,
    /// Matched and at least one field (or child item) differs
    Update,
    /// Matched with nothing to change
    Skip,
}

/// A single field that differs between the store and the extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub old_value: serde_json::Value,
    pub new_value: serde_json::Value,
}

impl FieldChange {
    pub fn new(
        field: impl Into<String>,
        old_value: impl Into<serde_json::Value>,
        new_value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryComparison {
    pub extracted: ExtractedCategory,
    pub existing_id: Option<String>,
    pub existing_name: Option<String>,
    pub action: ImportAction,
    pub match_score: f64,
    /// Category-level field changes (default VAT group)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
    pub items: Vec<ItemComparison>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemComparison {
    pub extracted: ExtractedItem,
    pub existing_id: Option<String>,
    pub existing_name: Option<String>,
    pub action: ImportAction,
    pub match_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<FieldChange>,
}

/// Option groups carry no field-level diff; only name similarity decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroupComparison {
    pub extracted: ExtractedOptionGroup,
    pub existing_id: Option<String>,
    pub existing_name: Option<String>,
    pub action: ImportAction,
    pub match_score: f64,
}

/// Counts derived from the comparison lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total_categories: usize,
    pub new_categories: usize,
    pub updated_categories: usize,
    pub total_items: usize,
    pub new_items: usize,
    pub updated_items: usize,
    pub total_option_groups: usize,
    pub new_option_groups: usize,
    pub updated_option_groups: usize,
}

/// The full comparison result, persisted verbatim on the import job.
///
/// Item comparisons live inside their category's `items`; use
/// [`MenuComparisonData::items`] for the flat list across categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuComparisonData {
    pub extracted: ExtractedMenuData,
    pub categories: Vec<CategoryComparison>,
    pub option_groups: Vec<OptionGroupComparison>,
    pub summary: ComparisonSummary,
}

impl MenuComparisonData {
    /// Every item comparison, flattened across categories.
    pub fn items(&self) -> impl Iterator<Item = &ItemComparison> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }
}
