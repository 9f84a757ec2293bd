//! Merging of per-chunk extractions into one.

use crate::types::menu::{ExtractedCategory, ExtractedMenuData, ExtractedOptionGroup};

/// Fold per-chunk extractions (in chunk order) into a single extraction.
///
/// Categories and option groups are keyed by lower-cased name. The first
/// occurrence keeps its position and fields; later occurrences contribute
/// their items (categories) or `applies_to` targets (option groups), and
/// fill fields the first occurrence left empty. Confidence is the mean of
/// the chunk confidences.
pub fn merge_chunks(chunks: Vec<ExtractedMenuData>) -> ExtractedMenuData {
    let count = chunks.len();
    if count == 0 {
        return ExtractedMenuData::empty();
    }

    let merged = chunks
        .into_iter()
        .fold(Accumulator::default(), Accumulator::absorb);

    ExtractedMenuData {
        categories: merged.categories,
        option_groups: merged.option_groups,
        confidence: merged.confidence_sum / count as f64,
    }
}

#[derive(Default)]
struct Accumulator {
    categories: Vec<ExtractedCategory>,
    option_groups: Vec<ExtractedOptionGroup>,
    confidence_sum: f64,
}

impl Accumulator {
    fn absorb(mut self, chunk: ExtractedMenuData) -> Self {
        self.confidence_sum += chunk.confidence;

        for category in chunk.categories {
            let key = merge_key(&category.name);
            match self.categories.iter_mut().find(|c| merge_key(&c.name) == key) {
                Some(existing) => {
                    fill(&mut existing.description, category.description);
                    fill(&mut existing.existing_category_id, category.existing_category_id);
                    fill(&mut existing.default_vat_group_code, category.default_vat_group_code);
                    existing.items.extend(category.items);
                }
                None => self.categories.push(category),
            }
        }

        for group in chunk.option_groups {
            let key = merge_key(&group.name);
            match self.option_groups.iter_mut().find(|g| merge_key(&g.name) == key) {
                Some(existing) => {
                    fill(&mut existing.description, group.description);
                    for target in group.applies_to {
                        if !existing.applies_to.contains(&target) {
                            existing.applies_to.push(target);
                        }
                    }
                }
                None => self.option_groups.push(group),
            }
        }

        self
    }
}

fn merge_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn fill(slot: &mut Option<String>, candidate: Option<String>) {
    if slot.is_none() {
        *slot = candidate;
    }
}
