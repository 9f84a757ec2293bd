//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{ImportError, Result};
use crate::jobs::sort_key::next_sort_key;
use crate::traits::store::{
    BlobStore, CategoryWrite, ItemWrite, JobStore, MenuStore, OptionGroupWrite,
};
use crate::types::{
    job::ImportJob,
    menu::{
        ExistingCategory, ExistingItem, ExistingMenuData, ExistingOptionGroup, OptionChoice,
        VatGroup,
    },
};

/// In-memory storage for uploaded files, store menus and import jobs.
///
/// Useful for testing and development. Not suitable for production
/// as data is lost on restart.
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    menus: RwLock<HashMap<String, StoreMenu>>,
    jobs: RwLock<HashMap<Uuid, ImportJob>>,
    next_id: AtomicU64,
    /// Remaining item writes before writes start failing (None = unlimited)
    item_write_budget: RwLock<Option<usize>>,
}

#[derive(Default)]
struct StoreMenu {
    categories: Vec<StoredCategory>,
    option_groups: Vec<StoredOptionGroup>,
    vat_groups: Vec<VatGroup>,
}

struct StoredCategory {
    category: ExistingCategory,
    sort_key: String,
}

/// An option group with the fields the snapshot does not expose.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredOptionGroup {
    pub group: ExistingOptionGroup,
    pub is_required: bool,
    pub choices: Vec<OptionChoice>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            menus: RwLock::new(HashMap::new()),
            jobs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            item_write_budget: RwLock::new(None),
        }
    }

    /// Store file bytes under `key`.
    pub fn put_blob(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.blobs.write().unwrap().insert(key.into(), bytes.into());
    }

    /// Replace a store's menu. Categories get ascending sort keys in order.
    pub fn seed_menu(&self, store_id: &str, menu: ExistingMenuData) {
        let mut menus = self.menus.write().unwrap();
        let entry = menus.entry(store_id.to_string()).or_default();

        let mut key: Option<String> = None;
        entry.categories = menu
            .categories
            .into_iter()
            .map(|category| {
                let sort_key = next_sort_key(key.as_deref());
                key = Some(sort_key.clone());
                StoredCategory { category, sort_key }
            })
            .collect();
        entry.option_groups = menu
            .option_groups
            .into_iter()
            .map(|group| StoredOptionGroup {
                group,
                is_required: false,
                choices: Vec::new(),
            })
            .collect();
    }

    /// Replace a store's VAT groups.
    pub fn seed_vat_groups(&self, store_id: &str, vat_groups: Vec<VatGroup>) {
        self.menus
            .write()
            .unwrap()
            .entry(store_id.to_string())
            .or_default()
            .vat_groups = vat_groups;
    }

    /// Let `n` more item writes succeed, then fail every later one.
    pub fn fail_item_writes_after(&self, n: usize) {
        *self.item_write_budget.write().unwrap() = Some(n);
    }

    /// Category names with their sort keys, in menu order.
    pub fn category_order(&self, store_id: &str) -> Vec<(String, String)> {
        self.menus
            .read()
            .unwrap()
            .get(store_id)
            .map(|m| {
                let mut order: Vec<(String, String)> = m
                    .categories
                    .iter()
                    .map(|c| (c.category.name.clone(), c.sort_key.clone()))
                    .collect();
                order.sort_by(|a, b| a.1.cmp(&b.1));
                order
            })
            .unwrap_or_default()
    }

    /// Full option group record, including choices.
    pub fn option_group(&self, store_id: &str, id: &str) -> Option<StoredOptionGroup> {
        self.menus
            .read()
            .unwrap()
            .get(store_id)?
            .option_groups
            .iter()
            .find(|g| g.group.id == id)
            .cloned()
    }

    /// Get the number of stored jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap().len()
    }

    fn new_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn consume_item_write(&self) -> Result<()> {
        let mut budget = self.item_write_budget.write().unwrap();
        match budget.as_mut() {
            Some(0) => Err(ImportError::storage("item write failed (injected)")),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

fn to_item(id: String, write: &ItemWrite) -> ExistingItem {
    ExistingItem {
        id,
        name: write.name.clone(),
        description: write.description.clone(),
        price: write.price,
        allergens: write.allergens.clone(),
        vat_group_id: write.vat_group_id.clone(),
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    async fn download(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| ImportError::storage(format!("blob not found: {}", key)))
    }
}

#[async_trait]
impl MenuStore for MemoryStore {
    async fn menu_snapshot(&self, store_id: &str) -> Result<ExistingMenuData> {
        let menus = self.menus.read().unwrap();
        let Some(menu) = menus.get(store_id) else {
            return Ok(ExistingMenuData::default());
        };

        let mut categories: Vec<&StoredCategory> = menu.categories.iter().collect();
        categories.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));

        Ok(ExistingMenuData {
            categories: categories.into_iter().map(|c| c.category.clone()).collect(),
            option_groups: menu.option_groups.iter().map(|g| g.group.clone()).collect(),
        })
    }

    async fn vat_groups(&self, store_id: &str) -> Result<Vec<VatGroup>> {
        Ok(self
            .menus
            .read()
            .unwrap()
            .get(store_id)
            .map(|m| m.vat_groups.clone())
            .unwrap_or_default())
    }

    async fn last_category_sort_key(&self, store_id: &str) -> Result<Option<String>> {
        Ok(self
            .menus
            .read()
            .unwrap()
            .get(store_id)
            .and_then(|m| m.categories.iter().map(|c| c.sort_key.clone()).max()))
    }

    async fn insert_category(
        &self,
        store_id: &str,
        category: &CategoryWrite,
        sort_key: &str,
    ) -> Result<String> {
        let id = self.new_id("cat");
        self.menus
            .write()
            .unwrap()
            .entry(store_id.to_string())
            .or_default()
            .categories
            .push(StoredCategory {
                category: ExistingCategory {
                    id: id.clone(),
                    name: category.name.clone(),
                    description: category.description.clone(),
                    default_vat_group_id: category.default_vat_group_id.clone(),
                    items: Vec::new(),
                },
                sort_key: sort_key.to_string(),
            });
        Ok(id)
    }

    async fn update_category(
        &self,
        store_id: &str,
        id: &str,
        category: &CategoryWrite,
    ) -> Result<()> {
        let mut menus = self.menus.write().unwrap();
        let stored = menus
            .get_mut(store_id)
            .and_then(|m| m.categories.iter_mut().find(|c| c.category.id == id))
            .ok_or_else(|| ImportError::storage(format!("category not found: {}", id)))?;

        stored.category.name = category.name.clone();
        stored.category.description = category.description.clone();
        stored.category.default_vat_group_id = category.default_vat_group_id.clone();
        Ok(())
    }

    async fn insert_item(&self, store_id: &str, item: &ItemWrite) -> Result<String> {
        self.consume_item_write()?;

        let id = self.new_id("item");
        let mut menus = self.menus.write().unwrap();
        let category = menus
            .get_mut(store_id)
            .and_then(|m| {
                m.categories
                    .iter_mut()
                    .find(|c| c.category.id == item.category_id)
            })
            .ok_or_else(|| {
                ImportError::storage(format!("category not found: {}", item.category_id))
            })?;

        category.category.items.push(to_item(id.clone(), item));
        Ok(id)
    }

    async fn update_item(&self, store_id: &str, id: &str, item: &ItemWrite) -> Result<()> {
        self.consume_item_write()?;

        let mut menus = self.menus.write().unwrap();
        let menu = menus
            .get_mut(store_id)
            .ok_or_else(|| ImportError::storage(format!("item not found: {}", id)))?;

        if !menu.categories.iter().any(|c| c.category.id == item.category_id) {
            return Err(ImportError::storage(format!(
                "category not found: {}",
                item.category_id
            )));
        }

        // Remove from wherever it is now; the write may move it
        let mut found = false;
        for stored in &mut menu.categories {
            let before = stored.category.items.len();
            stored.category.items.retain(|i| i.id != id);
            found |= stored.category.items.len() != before;
        }
        if !found {
            return Err(ImportError::storage(format!("item not found: {}", id)));
        }

        if let Some(target) = menu
            .categories
            .iter_mut()
            .find(|c| c.category.id == item.category_id)
        {
            target.category.items.push(to_item(id.to_string(), item));
        }
        Ok(())
    }

    async fn insert_option_group(
        &self,
        store_id: &str,
        group: &OptionGroupWrite,
    ) -> Result<String> {
        let id = self.new_id("og");
        self.menus
            .write()
            .unwrap()
            .entry(store_id.to_string())
            .or_default()
            .option_groups
            .push(StoredOptionGroup {
                group: ExistingOptionGroup {
                    id: id.clone(),
                    name: group.name.clone(),
                    description: group.description.clone(),
                    group_type: group.group_type,
                },
                is_required: group.is_required,
                choices: group.choices.clone(),
            });
        Ok(id)
    }

    async fn update_option_group(
        &self,
        store_id: &str,
        id: &str,
        group: &OptionGroupWrite,
    ) -> Result<()> {
        let mut menus = self.menus.write().unwrap();
        let stored = menus
            .get_mut(store_id)
            .and_then(|m| m.option_groups.iter_mut().find(|g| g.group.id == id))
            .ok_or_else(|| ImportError::storage(format!("option group not found: {}", id)))?;

        stored.group.name = group.name.clone();
        stored.group.description = group.description.clone();
        stored.group.group_type = group.group_type;
        stored.is_required = group.is_required;
        stored.choices = group.choices.clone();
        Ok(())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &ImportJob) -> Result<()> {
        self.jobs.write().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ImportJob>> {
        Ok(self.jobs.read().unwrap().get(&id).cloned())
    }

    async fn update_job(&self, job: &ImportJob) -> Result<()> {
        let mut jobs = self.jobs.write().unwrap();
        match jobs.get_mut(&job.id) {
            Some(stored) => {
                *stored = job.clone();
                Ok(())
            }
            None => Err(ImportError::JobNotFound { job_id: job.id }),
        }
    }
}
