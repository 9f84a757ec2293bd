//! Menu types - what the model extracts and what the store already holds.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

/// A structured menu extracted from an uploaded document.
///
/// Produced once per job and never mutated after the extraction
/// pipeline returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMenuData {
    #[serde(default)]
    pub categories: Vec<ExtractedCategory>,

    #[serde(default)]
    pub option_groups: Vec<ExtractedOptionGroup>,

    /// Model confidence in the extraction (0.0 to 1.0)
    #[serde(default)]
    pub confidence: f64,
}

impl ExtractedMenuData {
    /// An extraction with nothing in it and zero confidence.
    ///
    /// Returned in place of an error when model output cannot be parsed,
    /// so downstream steps always receive a well-shaped value.
    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            option_groups: Vec::new(),
            confidence: 0.0,
        }
    }

    /// True when no categories and no option groups were extracted.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.option_groups.is_empty()
    }

    /// Total items across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

/// A category as extracted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedCategory {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Model's claim that this is an existing category. Untrusted until
    /// the reference guard has checked it.
    #[serde(default)]
    pub existing_category_id: Option<String>,

    #[serde(default)]
    pub default_vat_group_code: Option<String>,

    #[serde(default)]
    pub items: Vec<ExtractedItem>,
}

/// An item as extracted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedItem {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Price in cents
    #[serde(default, deserialize_with = "deserialize_cents")]
    #[schemars(with = "u64")]
    pub price: u64,

    #[serde(default)]
    pub allergens: Option<Vec<String>>,

    /// Name of the parent category (redundant, used when flattening)
    #[serde(default)]
    pub category_name: String,

    #[serde(default)]
    pub existing_item_id: Option<String>,

    #[serde(default)]
    pub vat_group_code: Option<String>,
}

impl ExtractedItem {
    /// Create an item with just a name and a price in cents.
    pub fn new(name: impl Into<String>, price: u64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            allergens: None,
            category_name: String::new(),
            existing_item_id: None,
            vat_group_code: None,
        }
    }
}

/// Selection behaviour of an option group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionGroupType {
    #[default]
    SingleSelect,
    MultiSelect,
    QuantitySelect,
}

/// A modifier group (toppings, sizes, sides) as extracted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedOptionGroup {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub group_type: OptionGroupType,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub choices: Vec<OptionChoice>,

    /// Category or item names this group attaches to
    #[serde(default)]
    pub applies_to: Vec<String>,
}

/// One choice inside an option group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionChoice {
    pub name: String,

    /// Price delta in cents (may be negative for discounts)
    #[serde(default)]
    pub price_modifier: i64,
}

/// Accept integer, float or numeric-string prices and clamp to >= 0 cents.
fn deserialize_cents<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let cents = match &value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f > 0.0 {
                    f.round() as u64
                } else {
                    0
                }
            } else {
                0
            }
        }
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f > 0.0)
            .map(|f| f.round() as u64)
            .unwrap_or(0),
        _ => 0,
    };
    Ok(cents)
}

// ============================================================================
// Existing menu snapshot
// ============================================================================

/// Read-only snapshot of a merchant's current menu, taken before extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingMenuData {
    #[serde(default)]
    pub categories: Vec<ExistingCategory>,

    #[serde(default)]
    pub option_groups: Vec<ExistingOptionGroup>,
}

impl ExistingMenuData {
    /// All items across every category, in category order.
    pub fn all_items(&self) -> impl Iterator<Item = &ExistingItem> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_vat_group_id: Option<String>,
    #[serde(default)]
    pub items: Vec<ExistingItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in cents
    #[serde(default)]
    pub price: u64,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub vat_group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingOptionGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub group_type: OptionGroupType,
}

/// A merchant VAT group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatGroup {
    pub id: String,
    pub code: String,
    /// Rate as a percentage (e.g. 9.0)
    pub rate: f64,
}

/// Build the VAT code -> VAT id lookup used by diffing and applying.
pub fn vat_code_map(groups: &[VatGroup]) -> HashMap<String, String> {
    groups
        .iter()
        .map(|g| (g.code.clone(), g.id.clone()))
        .collect()
}

// ============================================================================
// Matching context
// ============================================================================

/// What the model is told about the merchant's current menu, and the
/// ground truth its asserted references are checked against.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingContext {
    pub categories: Vec<ContextCategory>,
    pub vat_groups: Vec<ContextVatGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextCategory {
    pub id: String,
    pub name: String,
    pub items: Vec<ContextItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextItem {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextVatGroup {
    pub code: String,
    pub rate: f64,
}

impl MatchingContext {
    /// Build a context from a menu snapshot and the merchant's VAT groups.
    pub fn from_menu(menu: &ExistingMenuData, vat_groups: &[VatGroup]) -> Self {
        Self {
            categories: menu
                .categories
                .iter()
                .map(|c| ContextCategory {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    items: c
                        .items
                        .iter()
                        .map(|i| ContextItem {
                            id: i.id.clone(),
                            name: i.name.clone(),
                        })
                        .collect(),
                })
                .collect(),
            vat_groups: vat_groups
                .iter()
                .map(|v| ContextVatGroup {
                    code: v.code.clone(),
                    rate: v.rate,
                })
                .collect(),
        }
    }

    /// The set of identifiers the model is allowed to reference.
    pub fn known_references(&self) -> KnownReferences {
        KnownReferences {
            category_ids: self.categories.iter().map(|c| c.id.clone()).collect(),
            item_ids: self
                .categories
                .iter()
                .flat_map(|c| c.items.iter().map(|i| i.id.clone()))
                .collect(),
            vat_codes: self.vat_groups.iter().map(|v| v.code.clone()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.vat_groups.is_empty()
    }
}

/// Ground-truth identifier sets for the reference guard.
#[derive(Debug, Clone, Default)]
pub struct KnownReferences {
    pub category_ids: HashSet<String>,
    pub item_ids: HashSet<String>,
    pub vat_codes: HashSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_item_deserialization() {
        let item: ExtractedItem = serde_json::from_str(r#"{"name": "Cola"}"#).unwrap();
        assert_eq!(item.name, "Cola");
        assert_eq!(item.price, 0);
        assert!(item.existing_item_id.is_none());
    }

    #[test]
    fn test_price_accepts_floats_and_strings() {
        let item: ExtractedItem = serde_json::from_str(r#"{"name": "A", "price": 249.6}"#).unwrap();
        assert_eq!(item.price, 250);

        let item: ExtractedItem = serde_json::from_str(r#"{"name": "A", "price": "350"}"#).unwrap();
        assert_eq!(item.price, 350);

        let item: ExtractedItem = serde_json::from_str(r#"{"name": "A", "price": -5}"#).unwrap();
        assert_eq!(item.price, 0);
    }

    #[test]
    fn test_option_group_type_wire_format() {
        let group: ExtractedOptionGroup = serde_json::from_str(
            r#"{"name": "Size", "type": "multi_select", "isRequired": true, "appliesTo": ["Pizza"]}"#,
        )
        .unwrap();
        assert_eq!(group.group_type, OptionGroupType::MultiSelect);
        assert!(group.is_required);
        assert_eq!(group.applies_to, vec!["Pizza".to_string()]);
    }

    #[test]
    fn test_known_references_from_context() {
        let menu = ExistingMenuData {
            categories: vec![ExistingCategory {
                id: "c1".into(),
                name: "Drinks".into(),
                description: None,
                default_vat_group_id: None,
                items: vec![ExistingItem {
                    id: "i1".into(),
                    name: "Cola".into(),
                    description: None,
                    price: 200,
                    allergens: vec![],
                    vat_group_id: None,
                }],
            }],
            option_groups: vec![],
        };
        let vat = vec![VatGroup {
            id: "v1".into(),
            code: "LOW".into(),
            rate: 9.0,
        }];

        let known = MatchingContext::from_menu(&menu, &vat).known_references();
        assert!(known.category_ids.contains("c1"));
        assert!(known.item_ids.contains("i1"));
        assert!(known.vat_codes.contains("LOW"));
        assert_eq!(vat_code_map(&vat).get("LOW"), Some(&"v1".to_string()));
    }
}
