//! End-to-end import job tests against the in-memory store and mock generator.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use menu_import::testing::MockGenerator;
use menu_import::{
    ApplyResult, ApplySelection, CallPolicy, ExistingCategory, ExistingItem, ExistingMenuData,
    ExistingOptionGroup, ImportAction, ImportConfig, ImportDeps, ImportError, ImportJob,
    ImportJobOrchestrator, JobStatus, JobStore, MemoryStore, MenuStore, OptionGroupType,
    SelectionType, VatGroup,
};

const STORE: &str = "store-1";
const MENU_CSV: &str = "Category,Item,Price\nDrinks,Cola,2.50\nDrinks,Tea,3.00\nDesserts,Pie,5.00\n";

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.put_blob("uploads/menu.csv", MENU_CSV.as_bytes().to_vec());
    store.seed_menu(
        STORE,
        ExistingMenuData {
            categories: vec![ExistingCategory {
                id: "cat-drinks".into(),
                name: "Drinks".into(),
                description: None,
                default_vat_group_id: None,
                items: vec![ExistingItem {
                    id: "item-cola".into(),
                    name: "Cola".into(),
                    description: None,
                    price: 200,
                    allergens: vec![],
                    vat_group_id: None,
                }],
            }],
            option_groups: vec![ExistingOptionGroup {
                id: "og-topping".into(),
                name: "Topping".into(),
                description: None,
                group_type: OptionGroupType::MultiSelect,
            }],
        },
    );
    store.seed_vat_groups(
        STORE,
        vec![VatGroup {
            id: "vat-low".into(),
            code: "LOW".into(),
            rate: 9.0,
        }],
    );
    store
}

fn model_menu() -> serde_json::Value {
    json!({
        "categories": [
            {
                "name": "drinks",
                "existingCategoryId": "cat-drinks",
                "items": [
                    {"name": "cola", "price": 250, "existingItemId": "item-cola"},
                    {"name": "tea", "price": 300, "vatGroupCode": "LOW"}
                ]
            },
            {
                "name": "desserts",
                "existingCategoryId": "cat-imaginary",
                "items": [{"name": "pie", "price": 500}]
            }
        ],
        "optionGroups": [
            {"name": "toppings", "type": "multi_select", "choices": [{"name": "cream", "priceModifier": 50}]}
        ],
        "confidence": 0.92
    })
}

fn orchestrator(store: Arc<MemoryStore>, generator: MockGenerator) -> ImportJobOrchestrator {
    let config = ImportConfig::default()
        .with_structured_output(false)
        .with_call_policy(CallPolicy::no_retry(Duration::from_secs(5)));
    ImportJobOrchestrator::with_config(ImportDeps::with_store(store, Arc::new(generator)), config)
}

async fn ready_job(store: Arc<MemoryStore>) -> (ImportJobOrchestrator, Uuid) {
    let generator = MockGenerator::new().with_text(model_menu().to_string());
    let orchestrator = orchestrator(store.clone(), generator);
    let job_id = insert_job(&store, "csv").await;
    assert_eq!(orchestrator.run_extraction(job_id).await.unwrap(), JobStatus::Ready);
    (orchestrator, job_id)
}

/// Insert a PROCESSING job without starting the background task.
async fn insert_job(store: &MemoryStore, file_type: &str) -> Uuid {
    let job = ImportJob::new(STORE, "menu.csv", file_type, "uploads/menu.csv");
    store.insert_job(&job).await.unwrap();
    job.id
}

fn all_selections() -> Vec<ApplySelection> {
    vec![
        ApplySelection::apply(SelectionType::Category, "Drinks"),
        ApplySelection::apply(SelectionType::Item, "Cola"),
        ApplySelection::apply(SelectionType::Item, "Tea"),
        ApplySelection::apply(SelectionType::Category, "Desserts"),
        ApplySelection::apply(SelectionType::Item, "Pie"),
        ApplySelection::apply(SelectionType::OptionGroup, "Toppings"),
    ]
}

#[tokio::test]
async fn test_extraction_produces_reviewable_comparison() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store).await;

    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Ready);
    assert!(view.error_message.is_none());

    let comparison = view.comparison_data.unwrap();
    let drinks = &comparison.categories[0];
    assert_eq!(drinks.extracted.name, "Drinks");
    assert_eq!(drinks.action, ImportAction::Update);
    assert_eq!(drinks.items[0].action, ImportAction::Update);
    assert_eq!(drinks.items[0].changes[0].field, "price");
    assert_eq!(drinks.items[1].action, ImportAction::Create);

    // Hallucinated category id was discarded before diffing
    let desserts = &comparison.categories[1];
    assert!(desserts.extracted.existing_category_id.is_none());
    assert_eq!(desserts.action, ImportAction::Create);

    assert_eq!(comparison.option_groups[0].action, ImportAction::Update);
    assert_eq!(comparison.option_groups[0].existing_id.as_deref(), Some("og-topping"));

    assert_eq!(comparison.summary.total_items, 3);
    let item_names: Vec<&str> = comparison.items().map(|i| i.extracted.name.as_str()).collect();
    assert_eq!(item_names, vec!["Cola", "Tea", "Pie"]);
    assert_eq!(comparison.summary.new_items, 2);
    assert_eq!(comparison.summary.updated_items, 1);
}

#[tokio::test]
async fn test_create_job_runs_extraction_in_background() {
    let store = seeded_store();
    let generator = MockGenerator::new().with_text(model_menu().to_string());
    let orchestrator = orchestrator(store, generator);

    let job_id = orchestrator
        .create_job(STORE, "menu.csv", "csv", "uploads/menu.csv")
        .await
        .unwrap();

    let mut status = JobStatus::Processing;
    for _ in 0..100 {
        status = orchestrator.job_status(STORE, job_id).await.unwrap().status;
        if status != JobStatus::Processing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, JobStatus::Ready);
}

#[tokio::test]
async fn test_unsupported_file_type_fails_job() {
    let store = seeded_store();
    let orchestrator = orchestrator(store.clone(), MockGenerator::new());
    let job_id = insert_job(&store, "pdf").await;

    let status = orchestrator.run_extraction(job_id).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(view.error_message.as_deref(), Some("unsupported file type: pdf"));
    assert!(view.comparison_data.is_none());
}

#[tokio::test]
async fn test_model_failure_fails_job() {
    let store = seeded_store();
    let generator = MockGenerator::new().with_failure("upstream unavailable");
    let orchestrator = orchestrator(store.clone(), generator);
    let job_id = insert_job(&store, "csv").await;

    assert_eq!(orchestrator.run_extraction(job_id).await.unwrap(), JobStatus::Failed);

    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(
        view.error_message.as_deref(),
        Some("AI service error: upstream unavailable")
    );
}

#[tokio::test]
async fn test_model_timeout_fails_job() {
    let store = seeded_store();
    let generator = MockGenerator::new().with_delay(Duration::from_millis(500));
    let config = ImportConfig::default()
        .with_structured_output(false)
        .with_call_policy(CallPolicy::no_retry(Duration::from_millis(20)));
    let orchestrator = ImportJobOrchestrator::with_config(
        ImportDeps::with_store(store.clone(), Arc::new(generator)),
        config,
    );
    let job_id = insert_job(&store, "csv").await;

    assert_eq!(orchestrator.run_extraction(job_id).await.unwrap(), JobStatus::Failed);
    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert!(view.error_message.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_extraction_is_noop_outside_processing() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store).await;

    assert_eq!(orchestrator.run_extraction(job_id).await.unwrap(), JobStatus::Ready);
}

#[tokio::test]
async fn test_unknown_job() {
    let store = seeded_store();
    let orchestrator = orchestrator(store, MockGenerator::new());

    let err = orchestrator.run_extraction(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ImportError::JobNotFound { .. }));
}

#[tokio::test]
async fn test_apply_completes_job() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store.clone()).await;

    let result = orchestrator
        .apply_changes(STORE, job_id, &all_selections())
        .await
        .unwrap();

    assert_eq!(
        result,
        ApplyResult {
            categories: 2,
            items: 3,
            option_groups: 1
        }
    );
    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);

    let menu = store.menu_snapshot(STORE).await.unwrap();
    assert_eq!(menu.categories.len(), 2);
    let cola = menu.categories[0].items.iter().find(|i| i.id == "item-cola").unwrap();
    assert_eq!(cola.price, 250);
    let tea = menu.categories[0].items.iter().find(|i| i.name == "Tea").unwrap();
    assert_eq!(tea.vat_group_id.as_deref(), Some("vat-low"));
    assert_eq!(menu.categories[1].name, "Desserts");

    let toppings = store.option_group(STORE, "og-topping").unwrap();
    assert_eq!(toppings.group.name, "Toppings");
    assert_eq!(toppings.choices[0].price_modifier, 50);
}

#[tokio::test]
async fn test_apply_with_no_selections_completes() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store.clone()).await;

    let result = orchestrator.apply_changes(STORE, job_id, &[]).await.unwrap();

    assert_eq!(result, ApplyResult::default());
    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Completed);
    assert_eq!(store.menu_snapshot(STORE).await.unwrap().categories[0].items[0].price, 200);
}

#[tokio::test]
async fn test_skipped_category_skips_its_items() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store.clone()).await;
    let selections = vec![
        ApplySelection::skip(SelectionType::Category, "Desserts"),
        ApplySelection::apply(SelectionType::Item, "Pie"),
    ];

    let result = orchestrator.apply_changes(STORE, job_id, &selections).await.unwrap();

    assert_eq!(result.items, 0);
    assert_eq!(store.menu_snapshot(STORE).await.unwrap().categories.len(), 1);
}

#[tokio::test]
async fn test_apply_requires_ready_job() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store).await;
    orchestrator.apply_changes(STORE, job_id, &[]).await.unwrap();

    let err = orchestrator
        .apply_changes(STORE, job_id, &all_selections())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::JobNotReady {
            status: JobStatus::Completed,
            ..
        }
    ));
}

#[tokio::test]
async fn test_partial_apply_failure_marks_failed_and_keeps_writes() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store.clone()).await;
    store.fail_item_writes_after(1);

    let err = orchestrator
        .apply_changes(STORE, job_id, &all_selections())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Storage(_)));
    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Failed);
    assert!(view.error_message.unwrap().contains("item write failed"));

    // Cola was written before Tea failed; no rollback
    let menu = store.menu_snapshot(STORE).await.unwrap();
    let cola = menu.categories[0].items.iter().find(|i| i.id == "item-cola").unwrap();
    assert_eq!(cola.price, 250);
    assert!(menu.categories[0].items.iter().all(|i| i.name != "Tea"));
}

#[tokio::test]
async fn test_other_store_cannot_see_or_apply_job() {
    let store = seeded_store();
    let (orchestrator, job_id) = ready_job(store).await;

    let err = orchestrator.job_status("store-2", job_id).await.unwrap_err();
    assert!(matches!(err, ImportError::StoreOwnershipMismatch { .. }));

    let err = orchestrator
        .apply_changes("store-2", job_id, &all_selections())
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::StoreOwnershipMismatch { .. }));

    let view = orchestrator.job_status(STORE, job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Ready);
}
