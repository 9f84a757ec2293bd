//! Post-decode normalization and the reference guard.

use crate::types::menu::{ExtractedMenuData, KnownReferences};

/// Unicode-aware title case: the first letter of every whitespace-delimited
/// word is uppercased and the rest lowercased.
///
/// ```
/// use menu_import::pipeline::normalize::title_case;
///
/// assert_eq!(title_case("  CRÈME brûlée "), "Crème Brûlée");
/// assert_eq!(title_case("ёжик в тумане"), "Ёжик В Тумане");
/// ```
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case every name in the extraction and clamp its confidence.
///
/// Items with an empty `category_name` inherit their parent's name.
pub fn normalize_extraction(data: &mut ExtractedMenuData) {
    for category in &mut data.categories {
        category.name = title_case(&category.name);
        for item in &mut category.items {
            item.name = title_case(&item.name);
            item.category_name = if item.category_name.trim().is_empty() {
                category.name.clone()
            } else {
                title_case(&item.category_name)
            };
        }
    }

    for group in &mut data.option_groups {
        group.name = title_case(&group.name);
        for choice in &mut group.choices {
            choice.name = title_case(&choice.name);
        }
        for target in &mut group.applies_to {
            *target = title_case(target);
        }
    }

    data.confidence = clamp_confidence(data.confidence);
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Null every model-asserted reference that is not in `known`.
///
/// Returns the number of references discarded. Nothing downstream may
/// trust an `existing_*_id` or VAT code that has not passed through here.
pub fn guard_references(data: &mut ExtractedMenuData, known: &KnownReferences) -> usize {
    let mut discarded = 0;

    for category in &mut data.categories {
        discarded += discard_unknown(&mut category.existing_category_id, &known.category_ids, "category");
        discarded += discard_unknown(&mut category.default_vat_group_code, &known.vat_codes, "vat_code");

        for item in &mut category.items {
            discarded += discard_unknown(&mut item.existing_item_id, &known.item_ids, "item");
            discarded += discard_unknown(&mut item.vat_group_code, &known.vat_codes, "vat_code");
        }
    }

    discarded
}

fn discard_unknown(
    field: &mut Option<String>,
    known: &std::collections::HashSet<String>,
    kind: &'static str,
) -> usize {
    if !matches!(field.as_deref(), Some(value) if !known.contains(value)) {
        return 0;
    }
    if let Some(value) = field.take() {
        tracing::debug!(kind, reference = %value, "Discarding hallucinated reference");
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::menu::{ExtractedCategory, ExtractedItem, ExtractedOptionGroup};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn category(name: &str, id: Option<&str>, items: Vec<ExtractedItem>) -> ExtractedCategory {
        ExtractedCategory {
            name: name.into(),
            description: None,
            existing_category_id: id.map(String::from),
            default_vat_group_code: None,
            items,
        }
    }

    fn known(categories: &[&str], items: &[&str], vat: &[&str]) -> KnownReferences {
        KnownReferences {
            category_ids: categories.iter().map(|s| s.to_string()).collect(),
            item_ids: items.iter().map(|s| s.to_string()).collect(),
            vat_codes: vat.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hot DRINKS"), "Hot Drinks");
        assert_eq!(title_case("çay"), "Çay");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_normalize_fills_category_name_and_clamps() {
        let mut data = ExtractedMenuData {
            categories: vec![category("DRINKS", None, vec![ExtractedItem::new("cola zero", 250)])],
            option_groups: vec![ExtractedOptionGroup {
                name: "extra toppings".into(),
                description: None,
                group_type: Default::default(),
                is_required: false,
                choices: vec![],
                applies_to: vec!["pizza".into()],
            }],
            confidence: 1.7,
        };

        normalize_extraction(&mut data);

        let item = &data.categories[0].items[0];
        assert_eq!(item.name, "Cola Zero");
        assert_eq!(item.category_name, "Drinks");
        assert_eq!(data.option_groups[0].name, "Extra Toppings");
        assert_eq!(data.option_groups[0].applies_to, vec!["Pizza".to_string()]);
        assert_eq!(data.confidence, 1.0);

        data.confidence = f64::NAN;
        normalize_extraction(&mut data);
        assert_eq!(data.confidence, 0.0);
    }

    #[test]
    fn test_guard_nulls_unknown_references() {
        let mut item = ExtractedItem::new("Cola", 250);
        item.existing_item_id = Some("made-up".into());
        item.vat_group_code = Some("LOW".into());
        let mut data = ExtractedMenuData {
            categories: vec![category("Drinks", Some("c1"), vec![item])],
            option_groups: vec![],
            confidence: 0.9,
        };

        let discarded = guard_references(&mut data, &known(&["c1"], &["i1"], &["LOW"]));

        assert_eq!(discarded, 1);
        assert_eq!(data.categories[0].existing_category_id.as_deref(), Some("c1"));
        assert!(data.categories[0].items[0].existing_item_id.is_none());
        assert_eq!(data.categories[0].items[0].vat_group_code.as_deref(), Some("LOW"));
    }

    #[test]
    fn test_guard_without_context_discards_everything() {
        let mut data = ExtractedMenuData {
            categories: vec![category("Drinks", Some("c1"), vec![])],
            option_groups: vec![],
            confidence: 0.9,
        };
        assert_eq!(guard_references(&mut data, &KnownReferences::default()), 1);
        assert!(data.categories[0].existing_category_id.is_none());
    }

    proptest! {
        #[test]
        fn guard_output_is_subset_of_known(
            asserted in prop::collection::vec(prop::option::of("[a-e]"), 0..12),
            known_ids in prop::collection::hash_set("[a-e]", 0..5),
        ) {
            let mut data = ExtractedMenuData {
                categories: asserted
                    .iter()
                    .map(|id| {
                        let mut item = ExtractedItem::new("X", 0);
                        item.existing_item_id = id.clone();
                        category("C", id.as_deref(), vec![item])
                    })
                    .collect(),
                option_groups: vec![],
                confidence: 0.5,
            };
            let refs = KnownReferences {
                category_ids: known_ids.clone(),
                item_ids: known_ids.clone(),
                vat_codes: HashSet::new(),
            };

            guard_references(&mut data, &refs);

            for c in &data.categories {
                if let Some(id) = &c.existing_category_id {
                    prop_assert!(known_ids.contains(id));
                }
                for i in &c.items {
                    if let Some(id) = &i.existing_item_id {
                        prop_assert!(known_ids.contains(id));
                    }
                }
            }
        }
    }
}
