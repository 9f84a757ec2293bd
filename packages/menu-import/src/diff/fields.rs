//! Field-level diffs between extracted and existing entities.

use std::collections::HashMap;

use serde_json::Value;

use crate::types::comparison::FieldChange;
use crate::types::menu::{ExistingCategory, ExistingItem, ExtractedCategory, ExtractedItem};

/// Resolve an extracted VAT code to a VAT group id. Unknown codes resolve to `None`.
pub fn resolve_vat(code: Option<&str>, vat_codes: &HashMap<String, String>) -> Option<String> {
    code.and_then(|c| vat_codes.get(c)).cloned()
}

/// Differences between an extracted item and the existing item it matched.
pub fn diff_item(
    extracted: &ExtractedItem,
    existing: &ExistingItem,
    vat_codes: &HashMap<String, String>,
) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if extracted.price != existing.price {
        changes.push(FieldChange::new("price", existing.price, extracted.price));
    }

    if extracted.name != existing.name {
        changes.push(FieldChange::new(
            "name",
            existing.name.as_str(),
            extracted.name.as_str(),
        ));
    }

    if extracted.description != existing.description {
        changes.push(FieldChange::new(
            "description",
            optional(&existing.description),
            optional(&extracted.description),
        ));
    }

    let new_allergens = extracted.allergens.clone().unwrap_or_default();
    if sorted(&new_allergens) != sorted(&existing.allergens) {
        changes.push(FieldChange::new(
            "allergens",
            existing.allergens.clone(),
            new_allergens,
        ));
    }

    let new_vat = resolve_vat(extracted.vat_group_code.as_deref(), vat_codes);
    if new_vat != existing.vat_group_id {
        changes.push(FieldChange::new(
            "vatGroupId",
            optional(&existing.vat_group_id),
            optional(&new_vat),
        ));
    }

    changes
}

/// Differences between an extracted category and the existing category it matched.
///
/// Only the default VAT group is compared.
pub fn diff_category(
    extracted: &ExtractedCategory,
    existing: &ExistingCategory,
    vat_codes: &HashMap<String, String>,
) -> Vec<FieldChange> {
    let new_vat = resolve_vat(extracted.default_vat_group_code.as_deref(), vat_codes);
    if new_vat == existing.default_vat_group_id {
        return Vec::new();
    }

    vec![FieldChange::new(
        "defaultVatGroupId",
        optional(&existing.default_vat_group_id),
        optional(&new_vat),
    )]
}

fn optional(value: &Option<String>) -> Value {
    value.as_deref().map_or(Value::Null, Value::from)
}

fn sorted(values: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = values.iter().map(String::as_str).collect();
    out.sort_unstable();
    out
}
