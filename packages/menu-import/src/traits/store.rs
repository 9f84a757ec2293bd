//! Storage traits for file blobs, menu entities and import jobs.
//!
//! Each trait is a narrow view of what the import pipeline consumes;
//! the schema behind them belongs to the host application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::types::{
    job::ImportJob,
    menu::{ExistingMenuData, OptionChoice, OptionGroupType, VatGroup},
};

/// Raw file storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch the bytes stored under `key`.
    async fn download(&self, key: &str) -> Result<Vec<u8>>;
}

/// Fields written when a category is inserted or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWrite {
    pub name: String,
    pub description: Option<String>,
    pub default_vat_group_id: Option<String>,
}

/// Fields written when an item is inserted or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWrite {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub allergens: Vec<String>,
    pub vat_group_id: Option<String>,
}

/// Fields written when an option group is inserted or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroupWrite {
    pub name: String,
    pub description: Option<String>,
    pub group_type: OptionGroupType,
    pub is_required: bool,
    pub choices: Vec<OptionChoice>,
}

/// Menu entity storage, scoped per merchant store.
#[async_trait]
pub trait MenuStore: Send + Sync {
    /// Snapshot of the store's current categories, items and option groups.
    async fn menu_snapshot(&self, store_id: &str) -> Result<ExistingMenuData>;

    /// The store's VAT groups.
    async fn vat_groups(&self, store_id: &str) -> Result<Vec<VatGroup>>;

    /// Sort key of the last category, if any.
    async fn last_category_sort_key(&self, store_id: &str) -> Result<Option<String>>;

    /// Insert a category at `sort_key`. Returns the new id.
    async fn insert_category(
        &self,
        store_id: &str,
        category: &CategoryWrite,
        sort_key: &str,
    ) -> Result<String>;

    async fn update_category(&self, store_id: &str, id: &str, category: &CategoryWrite)
        -> Result<()>;

    /// Insert an item. Returns the new id.
    async fn insert_item(&self, store_id: &str, item: &ItemWrite) -> Result<String>;

    async fn update_item(&self, store_id: &str, id: &str, item: &ItemWrite) -> Result<()>;

    /// Insert an option group. Returns the new id.
    async fn insert_option_group(&self, store_id: &str, group: &OptionGroupWrite)
        -> Result<String>;

    async fn update_option_group(
        &self,
        store_id: &str,
        id: &str,
        group: &OptionGroupWrite,
    ) -> Result<()>;
}

/// Import job persistence.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &ImportJob) -> Result<()>;

    async fn get_job(&self, id: Uuid) -> Result<Option<ImportJob>>;

    /// Replace the stored job with `job` (matched by id).
    async fn update_job(&self, job: &ImportJob) -> Result<()>;
}
