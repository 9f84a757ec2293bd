//! The menu diff engine.
//!
//! A pure function from `(extracted, existing, vat codes)` to a reviewable
//! change-set. No I/O, no clock, no hidden state: identical inputs always
//! produce identical output.
//!
//! Matching rules:
//! - Categories match only by a guarded `existing_category_id` (score 1 or 0)
//! - Items match only by a guarded `existing_item_id`, looked up across all
//!   existing categories since the model may move an item
//! - Option groups have no asserted id and match by name similarity
//!   (best score, `update` at >= 0.7, otherwise `create`)

pub mod fields;
pub mod similarity;

use std::collections::HashMap;

use crate::types::comparison::{
    CategoryComparison, ComparisonSummary, FieldChange, ImportAction, ItemComparison,
    MenuComparisonData, OptionGroupComparison,
};
use crate::types::menu::{
    ExistingCategory, ExistingItem, ExistingMenuData, ExistingOptionGroup, ExtractedCategory,
    ExtractedItem, ExtractedMenuData, ExtractedOptionGroup,
};

pub use fields::{diff_category, diff_item, resolve_vat};
pub use similarity::{levenshtein, similarity, OPTION_GROUP_MATCH_THRESHOLD};

/// Compare an extraction against the store's current menu.
///
/// `vat_codes` maps VAT group codes to VAT group ids.
pub fn compare_menus(
    extracted: &ExtractedMenuData,
    existing: &ExistingMenuData,
    vat_codes: &HashMap<String, String>,
) -> MenuComparisonData {
    let categories_by_id: HashMap<&str, &ExistingCategory> = existing
        .categories
        .iter()
        .map(|c| (c.id.as_str(), c))
        .collect();
    let items_by_id: HashMap<&str, &ExistingItem> =
        existing.all_items().map(|i| (i.id.as_str(), i)).collect();

    let categories: Vec<CategoryComparison> = extracted
        .categories
        .iter()
        .map(|c| compare_category(c, &categories_by_id, &items_by_id, vat_codes))
        .collect();

    let option_groups: Vec<OptionGroupComparison> = extracted
        .option_groups
        .iter()
        .map(|g| compare_option_group(g, &existing.option_groups))
        .collect();

    let summary = summarize(&categories, &option_groups);

    MenuComparisonData {
        extracted: extracted.clone(),
        categories,
        option_groups,
        summary,
    }
}

fn compare_category(
    extracted: &ExtractedCategory,
    categories_by_id: &HashMap<&str, &ExistingCategory>,
    items_by_id: &HashMap<&str, &ExistingItem>,
    vat_codes: &HashMap<String, String>,
) -> CategoryComparison {
    let matched = extracted
        .existing_category_id
        .as_deref()
        .and_then(|id| categories_by_id.get(id).copied());

    let items: Vec<ItemComparison> = extracted
        .items
        .iter()
        .map(|i| compare_item(i, items_by_id, vat_codes))
        .collect();

    let Some(existing) = matched else {
        return CategoryComparison {
            extracted: extracted.clone(),
            existing_id: None,
            existing_name: None,
            action: ImportAction::Create,
            match_score: 0.0,
            changes: Vec::new(),
            items,
        };
    };

    let changes = diff_category(extracted, existing, vat_codes);
    let items_changed = items.iter().any(|i| i.action != ImportAction::Skip);
    let action = classify(true, &changes, items_changed);

    CategoryComparison {
        extracted: extracted.clone(),
        existing_id: Some(existing.id.clone()),
        existing_name: Some(existing.name.clone()),
        action,
        match_score: 1.0,
        changes,
        items,
    }
}

fn compare_item(
    extracted: &ExtractedItem,
    items_by_id: &HashMap<&str, &ExistingItem>,
    vat_codes: &HashMap<String, String>,
) -> ItemComparison {
    let matched = extracted
        .existing_item_id
        .as_deref()
        .and_then(|id| items_by_id.get(id).copied());

    match matched {
        Some(existing) => {
            let changes = diff_item(extracted, existing, vat_codes);
            ItemComparison {
                extracted: extracted.clone(),
                existing_id: Some(existing.id.clone()),
                existing_name: Some(existing.name.clone()),
                action: classify(true, &changes, false),
                match_score: 1.0,
                changes,
            }
        }
        None => ItemComparison {
            extracted: extracted.clone(),
            existing_id: None,
            existing_name: None,
            action: ImportAction::Create,
            match_score: 0.0,
            changes: Vec::new(),
        },
    }
}

fn compare_option_group(
    extracted: &ExtractedOptionGroup,
    existing: &[ExistingOptionGroup],
) -> OptionGroupComparison {
    // First group wins on equal scores
    let best = existing
        .iter()
        .map(|g| (g, similarity(&extracted.name, &g.name)))
        .fold(None::<(&ExistingOptionGroup, f64)>, |best, (g, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((g, score)),
        });

    match best {
        Some((group, score)) if score >= OPTION_GROUP_MATCH_THRESHOLD => OptionGroupComparison {
            extracted: extracted.clone(),
            existing_id: Some(group.id.clone()),
            existing_name: Some(group.name.clone()),
            action: ImportAction::Update,
            match_score: score,
        },
        best => OptionGroupComparison {
            extracted: extracted.clone(),
            existing_id: None,
            existing_name: None,
            action: ImportAction::Create,
            match_score: best.map_or(0.0, |(_, score)| score),
        },
    }
}

/// `create` without a match, `skip` when nothing changed, `update` otherwise.
pub fn classify(matched: bool, changes: &[FieldChange], children_changed: bool) -> ImportAction {
    if !matched {
        ImportAction::Create
    } else if changes.is_empty() && !children_changed {
        ImportAction::Skip
    } else {
        ImportAction::Update
    }
}

fn summarize(
    categories: &[CategoryComparison],
    option_groups: &[OptionGroupComparison],
) -> ComparisonSummary {
    let (total_categories, new_categories, updated_categories) =
        tally(categories.iter().map(|c| c.action));
    let (total_items, new_items, updated_items) =
        tally(categories.iter().flat_map(|c| c.items.iter()).map(|i| i.action));
    let (total_option_groups, new_option_groups, updated_option_groups) =
        tally(option_groups.iter().map(|g| g.action));

    ComparisonSummary {
        total_categories,
        new_categories,
        updated_categories,
        total_items,
        new_items,
        updated_items,
        total_option_groups,
        new_option_groups,
        updated_option_groups,
    }
}

/// (total, created, updated)
fn tally(actions: impl Iterator<Item = ImportAction>) -> (usize, usize, usize) {
    actions.fold((0, 0, 0), |(total, new, updated), action| match action {
        ImportAction::Create => (total + 1, new + 1, updated),
        ImportAction::Update => (total + 1, new, updated + 1),
        ImportAction::Skip => (total + 1, new, updated),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::menu::OptionGroupType;

    fn existing_menu() -> ExistingMenuData {
        ExistingMenuData {
            categories: vec![
                ExistingCategory {
                    id: "cat-drinks".into(),
                    name: "Drinks".into(),
                    description: None,
                    default_vat_group_id: None,
                    items: vec![ExistingItem {
                        id: "X".into(),
                        name: "Cola".into(),
                        description: None,
                        price: 200,
                        allergens: vec![],
                        vat_group_id: None,
                    }],
                },
                ExistingCategory {
                    id: "cat-food".into(),
                    name: "Food".into(),
                    description: None,
                    default_vat_group_id: None,
                    items: vec![ExistingItem {
                        id: "Y".into(),
                        name: "Fries".into(),
                        description: None,
                        price: 350,
                        allergens: vec![],
                        vat_group_id: None,
                    }],
                },
            ],
            option_groups: vec![
                ExistingOptionGroup {
                    id: "og-topping".into(),
                    name: "Topping".into(),
                    description: None,
                    group_type: OptionGroupType::MultiSelect,
                },
                ExistingOptionGroup {
                    id: "og-drinks".into(),
                    name: "Drinks".into(),
                    description: None,
                    group_type: OptionGroupType::SingleSelect,
                },
            ],
        }
    }

    fn item(name: &str, price: u64, id: Option<&str>) -> ExtractedItem {
        let mut item = ExtractedItem::new(name, price);
        item.existing_item_id = id.map(String::from);
        item
    }

    fn category(name: &str, id: Option<&str>, items: Vec<ExtractedItem>) -> ExtractedCategory {
        ExtractedCategory {
            name: name.into(),
            description: None,
            existing_category_id: id.map(String::from),
            default_vat_group_code: None,
            items,
        }
    }

    fn group(name: &str) -> ExtractedOptionGroup {
        ExtractedOptionGroup {
            name: name.into(),
            description: None,
            group_type: OptionGroupType::MultiSelect,
            is_required: false,
            choices: vec![],
            applies_to: vec![],
        }
    }

    fn extraction(categories: Vec<ExtractedCategory>, groups: Vec<ExtractedOptionGroup>) -> ExtractedMenuData {
        ExtractedMenuData {
            categories,
            option_groups: groups,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_cola_price_update() {
        let extracted = extraction(
            vec![category("Drinks", Some("cat-drinks"), vec![item("Cola", 250, Some("X"))])],
            vec![],
        );

        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());

        let cola = &result.categories[0].items[0];
        assert_eq!(cola.action, ImportAction::Update);
        assert_eq!(cola.changes, vec![FieldChange::new("price", 200u64, 250u64)]);
        // Category fields unchanged, but a child changed
        assert!(result.categories[0].changes.is_empty());
        assert_eq!(result.categories[0].action, ImportAction::Update);
    }

    #[test]
    fn test_unchanged_category_and_item_skip() {
        let extracted = extraction(
            vec![category("Drinks", Some("cat-drinks"), vec![item("Cola", 200, Some("X"))])],
            vec![],
        );

        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());

        assert_eq!(result.categories[0].action, ImportAction::Skip);
        assert_eq!(result.categories[0].items[0].action, ImportAction::Skip);
        assert_eq!(result.summary.updated_categories, 0);
        assert_eq!(result.summary.total_items, 1);
    }

    #[test]
    fn test_items_match_across_categories() {
        // Fries now listed under Drinks; still matched by id
        let extracted = extraction(
            vec![category("Drinks", Some("cat-drinks"), vec![item("Fries", 350, Some("Y"))])],
            vec![],
        );

        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());

        let fries = &result.categories[0].items[0];
        assert_eq!(fries.existing_id.as_deref(), Some("Y"));
        assert_eq!(fries.action, ImportAction::Skip);
    }

    #[test]
    fn test_unmatched_entities_are_created() {
        let extracted = extraction(
            vec![category("Desserts", None, vec![item("Pie", 500, None)])],
            vec![],
        );

        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());

        assert_eq!(result.categories[0].action, ImportAction::Create);
        assert_eq!(result.categories[0].match_score, 0.0);
        assert_eq!(result.categories[0].items[0].action, ImportAction::Create);
        assert_eq!(result.summary.new_categories, 1);
        assert_eq!(result.summary.new_items, 1);
    }

    #[test]
    fn test_category_id_not_in_snapshot_is_create() {
        // No fuzzy fallback: a name match alone is not enough
        let extracted = extraction(vec![category("Drinks", Some("gone"), vec![])], vec![]);

        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());
        assert_eq!(result.categories[0].action, ImportAction::Create);
    }

    #[test]
    fn test_option_groups_fuzzy_match() {
        let extracted = extraction(vec![], vec![group("Toppings"), group("Sauces")]);

        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());

        let toppings = &result.option_groups[0];
        assert_eq!(toppings.action, ImportAction::Update);
        assert_eq!(toppings.existing_id.as_deref(), Some("og-topping"));
        assert!((toppings.match_score - 0.875).abs() < 1e-9);

        let sauces = &result.option_groups[1];
        assert_eq!(sauces.action, ImportAction::Create);
        assert!(sauces.existing_id.is_none());

        assert_eq!(result.summary.total_option_groups, 2);
        assert_eq!(result.summary.new_option_groups, 1);
        assert_eq!(result.summary.updated_option_groups, 1);
    }

    #[test]
    fn test_identical_option_group_is_still_update() {
        let extracted = extraction(vec![], vec![group("Topping")]);
        let result = compare_menus(&extracted, &existing_menu(), &HashMap::new());
        assert_eq!(result.option_groups[0].action, ImportAction::Update);
        assert_eq!(result.option_groups[0].match_score, 1.0);
    }

    #[test]
    fn test_diff_is_deterministic() {
        let extracted = extraction(
            vec![
                category("Drinks", Some("cat-drinks"), vec![item("Cola", 250, Some("X"))]),
                category("Desserts", None, vec![item("Pie", 500, None)]),
            ],
            vec![group("Toppings")],
        );
        let vat = HashMap::from([("LOW".to_string(), "vat-low".to_string())]);

        let first = serde_json::to_string(&compare_menus(&extracted, &existing_menu(), &vat)).unwrap();
        let second = serde_json::to_string(&compare_menus(&extracted, &existing_menu(), &vat)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_classify() {
        let change = FieldChange::new("price", 1, 2);
        assert_eq!(classify(false, &[], false), ImportAction::Create);
        assert_eq!(classify(true, &[], false), ImportAction::Skip);
        assert_eq!(classify(true, &[change], false), ImportAction::Update);
        assert_eq!(classify(true, &[], true), ImportAction::Update);
    }
}
