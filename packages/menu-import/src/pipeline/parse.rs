//! Decoding of model output into [`ExtractedMenuData`].
//!
//! Model output is decoded into one of a fixed set of response shapes,
//! tried in order. Anything that matches none of them decodes to
//! [`ModelResponse::Unparseable`], which becomes an empty zero-confidence
//! extraction instead of an error.
//!
//! Categories, items and option groups are decoded one element at a time;
//! a malformed element is dropped without losing its siblings.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::types::menu::{ExtractedCategory, ExtractedItem, ExtractedMenuData};

/// Confidence assigned to shapes that carry no confidence of their own.
pub const IMPLICIT_CONFIDENCE: f64 = 0.5;

/// Top-level keys never treated as implicit categories.
const RESERVED_KEYS: &[&str] = &[
    "categories",
    "optionGroups",
    "option_groups",
    "confidence",
    "metadata",
    "notes",
    "warnings",
    "errors",
];

/// The response shapes the pipeline understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// `{"categories": [...], "optionGroups": [...], "confidence": ..}`
    Menu(ExtractedMenuData),
    /// A bare top-level array of categories.
    CategoryList(Vec<ExtractedCategory>),
    /// An object whose array-valued keys are categories of items,
    /// e.g. `{"hot_drinks": [{"name": "Tea", "price": 250}]}`.
    ImplicitCategories(ExtractedMenuData),
    /// Nothing usable.
    Unparseable,
}

impl ModelResponse {
    /// Decode free-form chat output.
    pub fn from_text(raw: &str) -> Self {
        let body = strip_code_fences(raw);
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                debug!(error = %e, len = raw.len(), "Model output is not valid JSON");
                Self::Unparseable
            }
        }
    }

    /// Decode an already-parsed JSON value (structured mode or chat mode).
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => match decode_menu(&map) {
                Some(menu) => Self::Menu(menu),
                None => decode_implicit(&map),
            },
            Value::Array(elements) => {
                let categories: Vec<ExtractedCategory> =
                    elements.iter().filter_map(decode_category).collect();
                if categories.is_empty() {
                    Self::Unparseable
                } else {
                    Self::CategoryList(categories)
                }
            }
            _ => Self::Unparseable,
        }
    }

    /// True when decoding fell through every known shape.
    pub fn is_unparseable(&self) -> bool {
        matches!(self, Self::Unparseable)
    }

    /// Collapse into the canonical extraction type.
    pub fn into_menu(self) -> ExtractedMenuData {
        match self {
            Self::Menu(menu) | Self::ImplicitCategories(menu) => menu,
            Self::CategoryList(categories) => ExtractedMenuData {
                categories,
                option_groups: Vec::new(),
                confidence: IMPLICIT_CONFIDENCE,
            },
            Self::Unparseable => ExtractedMenuData::empty(),
        }
    }
}

/// Remove a surrounding Markdown code fence (with optional language tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json") on the opening fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Decode every element that fits `T`, dropping the rest.
fn decode_each<T: DeserializeOwned>(values: &[Value]) -> Vec<T> {
    let decoded: Vec<T> = values
        .iter()
        .filter_map(|v| serde_json::from_value(v.clone()).ok())
        .collect();
    if decoded.len() < values.len() {
        debug!(dropped = values.len() - decoded.len(), "Dropped malformed elements from model output");
    }
    decoded
}

/// A category object with its items decoded individually.
fn decode_category(value: &Value) -> Option<ExtractedCategory> {
    let Value::Object(fields) = value else {
        return None;
    };
    let mut shell = fields.clone();
    let raw_items = shell.remove("items");

    let mut category: ExtractedCategory = serde_json::from_value(Value::Object(shell)).ok()?;
    category.items = match raw_items {
        Some(Value::Array(items)) => decode_each(&items),
        _ => Vec::new(),
    };
    Some(category)
}

/// The canonical `{"categories": [..]}` shape.
///
/// `None` when there is no `categories` array, or when every element it
/// offers is malformed.
fn decode_menu(map: &Map<String, Value>) -> Option<ExtractedMenuData> {
    let Some(Value::Array(raw_categories)) = map.get("categories") else {
        return None;
    };
    let raw_groups: &[Value] = map
        .get("optionGroups")
        .or_else(|| map.get("option_groups"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let categories: Vec<ExtractedCategory> =
        raw_categories.iter().filter_map(decode_category).collect();
    let option_groups = decode_each(raw_groups);

    let offered = raw_categories.len() + raw_groups.len();
    if offered > 0 && categories.is_empty() && option_groups.is_empty() {
        return None;
    }

    Some(ExtractedMenuData {
        categories,
        option_groups,
        confidence: map.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

fn decode_implicit(map: &Map<String, Value>) -> ModelResponse {
    let mut categories = Vec::new();

    for (key, value) in map {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let Value::Array(elements) = value else {
            continue;
        };

        let name = category_name_from_key(key);
        let items: Vec<ExtractedItem> = decode_each::<ExtractedItem>(elements)
            .into_iter()
            .map(|mut item| {
                item.category_name = name.clone();
                item
            })
            .collect();

        if items.is_empty() {
            continue;
        }

        categories.push(ExtractedCategory {
            name,
            description: None,
            existing_category_id: None,
            default_vat_group_code: None,
            items,
        });
    }

    if categories.is_empty() {
        return ModelResponse::Unparseable;
    }

    let confidence = map
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(IMPLICIT_CONFIDENCE);

    ModelResponse::ImplicitCategories(ExtractedMenuData {
        categories,
        option_groups: Vec::new(),
        confidence,
    })
}

/// `hot_drinks` / `hot-drinks` -> `Hot Drinks`.
fn category_name_from_key(key: &str) -> String {
    let spaced = key.replace(&['_', '-'][..], " ");
    super::normalize::title_case(&spaced)
}
