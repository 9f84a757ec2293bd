//! Materializing user selections against the menu store.

use std::collections::HashMap;

use tracing::debug;

use crate::diff::resolve_vat;
use crate::error::Result;
use crate::traits::store::{CategoryWrite, ItemWrite, MenuStore, OptionGroupWrite};
use crate::types::comparison::{CategoryComparison, MenuComparisonData, OptionGroupComparison};
use crate::types::job::{ApplyResult, ApplySelection, SelectionAction, SelectionType};
use crate::types::menu::vat_code_map;

use super::sort_key::next_sort_key;

/// Apply-flagged selections keyed by `(type, extracted name)`.
///
/// The first selection for a key wins.
struct Selections<'a> {
    by_key: HashMap<(SelectionType, &'a str), &'a ApplySelection>,
}

impl<'a> Selections<'a> {
    fn new(selections: &'a [ApplySelection]) -> Self {
        let mut by_key = HashMap::new();
        for selection in selections
            .iter()
            .filter(|s| s.action == SelectionAction::Apply)
        {
            by_key
                .entry((selection.selection_type, selection.extracted_name.as_str()))
                .or_insert(selection);
        }
        Self { by_key }
    }

    fn get(&self, selection_type: SelectionType, name: &str) -> Option<&'a ApplySelection> {
        self.by_key.get(&(selection_type, name)).copied()
    }

    fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Write every apply-flagged entity of `comparison` to the store.
///
/// Writes are independent: a failure part-way leaves earlier writes in
/// place. Items are only written under a category that was itself applied.
pub(crate) async fn apply_selections(
    menus: &dyn MenuStore,
    store_id: &str,
    comparison: &MenuComparisonData,
    selections: &[ApplySelection],
) -> Result<ApplyResult> {
    let selections = Selections::new(selections);
    let mut result = ApplyResult::default();

    if selections.is_empty() {
        return Ok(result);
    }

    // Fetched now; VAT groups may have changed since extraction
    let vat_codes = vat_code_map(&menus.vat_groups(store_id).await?);
    let mut last_sort_key = menus.last_category_sort_key(store_id).await?;

    for category in &comparison.categories {
        let name = category.extracted.name.as_str();
        let Some(selection) = selections.get(SelectionType::Category, name) else {
            debug!(category = %name, items = category.items.len(), "Category not applied, skipping its items");
            continue;
        };

        let category_id =
            apply_category(menus, store_id, category, selection, &vat_codes, &mut last_sort_key)
                .await?;
        result.categories += 1;

        for item in &category.items {
            let Some(item_selection) = selections.get(SelectionType::Item, &item.extracted.name)
            else {
                continue;
            };

            let write = ItemWrite {
                category_id: category_id.clone(),
                name: item.extracted.name.clone(),
                description: item.extracted.description.clone(),
                price: item.extracted.price,
                allergens: item.extracted.allergens.clone().unwrap_or_default(),
                vat_group_id: resolve_vat(item.extracted.vat_group_code.as_deref(), &vat_codes),
            };

            match item_selection
                .matched_entity_id
                .as_deref()
                .or(item.existing_id.as_deref())
            {
                Some(id) => menus.update_item(store_id, id, &write).await?,
                None => {
                    menus.insert_item(store_id, &write).await?;
                }
            }
            result.items += 1;
        }
    }

    for group in &comparison.option_groups {
        let Some(selection) = selections.get(SelectionType::OptionGroup, &group.extracted.name)
        else {
            continue;
        };
        apply_option_group(menus, store_id, group, selection).await?;
        result.option_groups += 1;
    }

    Ok(result)
}

/// Update or insert one category. Returns the id items should attach to.
async fn apply_category(
    menus: &dyn MenuStore,
    store_id: &str,
    category: &CategoryComparison,
    selection: &ApplySelection,
    vat_codes: &HashMap<String, String>,
    last_sort_key: &mut Option<String>,
) -> Result<String> {
    let write = CategoryWrite {
        name: category.extracted.name.clone(),
        description: category.extracted.description.clone(),
        default_vat_group_id: resolve_vat(
            category.extracted.default_vat_group_code.as_deref(),
            vat_codes,
        ),
    };

    let existing_id = selection
        .matched_entity_id
        .as_deref()
        .or(category.existing_id.as_deref());

    match existing_id {
        Some(id) => {
            menus.update_category(store_id, id, &write).await?;
            Ok(id.to_string())
        }
        None => {
            let sort_key = next_sort_key(last_sort_key.as_deref());
            let id = menus.insert_category(store_id, &write, &sort_key).await?;
            *last_sort_key = Some(sort_key);
            Ok(id)
        }
    }
}

async fn apply_option_group(
    menus: &dyn MenuStore,
    store_id: &str,
    group: &OptionGroupComparison,
    selection: &ApplySelection,
) -> Result<()> {
    let write = OptionGroupWrite {
        name: group.extracted.name.clone(),
        description: group.extracted.description.clone(),
        group_type: group.extracted.group_type,
        is_required: group.extracted.is_required,
        choices: group.extracted.choices.clone(),
    };

    match selection
        .matched_entity_id
        .as_deref()
        .or(group.existing_id.as_deref())
    {
        Some(id) => menus.update_option_group(store_id, id, &write).await,
        None => menus.insert_option_group(store_id, &write).await.map(|_| ()),
    }
}
