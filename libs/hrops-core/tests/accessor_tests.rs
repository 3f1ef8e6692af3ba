//! Accessor behaviour observed through a recording data service

use async_trait::async_trait;
use hrops_core::{
    database::{DeleteRequest, InsertRequest, SelectRequest, UpdateRequest},
    test_utils::{full_identity, memory_context, memory_database, tenant_identity, TEST_COMPANY},
    AccessorSettings, DataService, EntityAccessor, EntityConfig, HrOpsDatabase, HrOpsError,
    QueryFilters, QueryOptions, Record, RecordId, ResultMode, SessionIdentity, StoreContext, Task,
    TaskStore,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Forwards to a real database and remembers every request
#[derive(Debug)]
struct RecordingService {
    inner: HrOpsDatabase,
    selects: Mutex<Vec<SelectRequest>>,
    updates: Mutex<Vec<UpdateRequest>>,
    deletes: Mutex<Vec<DeleteRequest>>,
}

impl RecordingService {
    async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: memory_database().await,
            selects: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DataService for RecordingService {
    async fn select(&self, request: SelectRequest) -> hrops_core::Result<Vec<Record>> {
        self.selects.lock().push(request.clone());
        self.inner.select(request).await
    }

    async fn insert(&self, request: InsertRequest) -> hrops_core::Result<Record> {
        self.inner.insert(request).await
    }

    async fn update(&self, request: UpdateRequest) -> hrops_core::Result<Option<Record>> {
        self.updates.lock().push(request.clone());
        self.inner.update(request).await
    }

    async fn delete(&self, request: DeleteRequest) -> hrops_core::Result<Option<RecordId>> {
        self.deletes.lock().push(request.clone());
        self.inner.delete(request).await
    }
}

/// Rejects every call
#[derive(Debug)]
struct FailingService;

#[async_trait]
impl DataService for FailingService {
    async fn select(&self, _request: SelectRequest) -> hrops_core::Result<Vec<Record>> {
        Err(HrOpsError::Database("permission denied".to_string()))
    }

    async fn insert(&self, _request: InsertRequest) -> hrops_core::Result<Record> {
        Err(HrOpsError::Database("permission denied".to_string()))
    }

    async fn update(&self, _request: UpdateRequest) -> hrops_core::Result<Option<Record>> {
        Err(HrOpsError::Database("permission denied".to_string()))
    }

    async fn delete(&self, _request: DeleteRequest) -> hrops_core::Result<Option<RecordId>> {
        Err(HrOpsError::Database("permission denied".to_string()))
    }
}

fn attendance_config() -> EntityConfig {
    EntityConfig::new("attendance", "Attendance")
        .company_scoped()
        .user_scoped()
}

// ============================================================================
// Requests sent to the backend
// ============================================================================

#[tokio::test]
async fn test_reads_carry_scope_and_lists_force_many() {
    let service = RecordingService::new().await;
    let context = StoreContext::new(service.clone(), full_identity());
    let accessor: EntityAccessor<Record> = EntityAccessor::new(&context, attendance_config());

    accessor
        .fetch_items_with_query(QueryFilters::new(), QueryOptions::new().single())
        .await;
    accessor.fetch_item(5).await;

    let selects = service.selects.lock();
    assert_eq!(selects.len(), 2);
    assert_eq!(selects[0].scope.company_id, Some(TEST_COMPANY));
    assert!(selects[0].scope.user_id.is_some());
    assert_eq!(selects[0].options.mode, ResultMode::Many);
    assert_eq!(selects[1].options.mode, ResultMode::MaybeSingle);
    assert_eq!(selects[1].filters.eq, vec![("id".to_string(), json!(5))]);
}

#[tokio::test]
async fn test_unavailable_scope_never_reaches_backend() {
    let service = RecordingService::new().await;
    let context = StoreContext::new(service.clone(), tenant_identity(TEST_COMPANY));
    let accessor: EntityAccessor<Record> = EntityAccessor::new(&context, attendance_config());

    assert!(accessor.fetch_items(None).await.is_empty());
    assert!(accessor.fetch_item(1).await.is_none());
    assert!(service.selects.lock().is_empty());
}

#[tokio::test]
async fn test_update_and_delete_are_guarded_by_tenant_only() {
    let service = RecordingService::new().await;
    let context = StoreContext::new(service.clone(), full_identity());
    let accessor: EntityAccessor<Record> = EntityAccessor::new(&context, attendance_config());

    let created = accessor
        .create_item(&json!({"attendance_date": "2024-05-01"}))
        .await
        .unwrap()
        .into_result()
        .unwrap();
    let id = created["id"].as_i64().unwrap();

    accessor
        .update_item(
            id,
            &json!({"id": 99, "company_id": 7, "user_id": "someone", "tag": "Late"}),
        )
        .await
        .unwrap();
    accessor.delete_item(id).await.unwrap();

    let updates = service.updates.lock();
    let update = &updates[0];
    assert_eq!(update.guard.company_id, Some(TEST_COMPANY));
    assert!(update.guard.user_id.is_none());
    assert!(!update.changes.contains_key("id"));
    assert!(!update.changes.contains_key("company_id"));
    assert!(!update.changes.contains_key("user_id"));
    assert_eq!(update.changes.get("tag"), Some(&json!("Late")));
    assert!(update.changes.contains_key("updated_at"));

    let deletes = service.deletes.lock();
    assert_eq!(deletes[0].id, id);
    assert_eq!(deletes[0].guard.company_id, Some(TEST_COMPANY));
}

#[tokio::test]
async fn test_unscoped_delete_has_empty_guard() {
    let service = RecordingService::new().await;
    let context = StoreContext::new(service.clone(), SessionIdentity::anonymous());
    let accessor: EntityAccessor<Record> =
        EntityAccessor::new(&context, EntityConfig::new("grades", "Grade"));

    let result = accessor.delete_item(1).await.unwrap();
    assert!(!result.success);
    assert!(service.deletes.lock()[0].guard.is_empty());
}

// ============================================================================
// Failure reporting
// ============================================================================

#[tokio::test]
async fn test_backend_failures_are_caught_and_stored() {
    let context = StoreContext::new(Arc::new(FailingService), tenant_identity(TEST_COMPANY));
    let tasks = TaskStore::new(&context);

    assert!(tasks.fetch_tasks().await.is_empty());
    assert!(tasks.accessor().error().unwrap().contains("permission denied"));

    tasks.accessor().clear_error();
    let created = tasks.accessor().create_item(&json!({"task_title": "x"})).await.unwrap();
    assert!(!created.success);
    assert!(created.data.is_none());
    assert_eq!(tasks.accessor().error(), created.error);

    let updated = tasks.complete_task(1).await.unwrap();
    assert!(updated.error.unwrap().contains("permission denied"));
    let deleted = tasks.delete_task(1).await.unwrap();
    assert!(!deleted.success);

    let state = tasks.accessor().state();
    assert!(!state.loading && !state.creating && !state.updating && !state.deleting);
}

#[tokio::test]
async fn test_next_operation_clears_previous_error() {
    let tasks = TaskStore::new(&memory_context(tenant_identity(TEST_COMPANY)).await);
    tasks
        .accessor()
        .fetch_items_with_query(
            QueryFilters::builder().eq("missing", 1).build(),
            QueryOptions::new(),
        )
        .await;
    assert!(tasks.accessor().error().is_some());

    tasks.fetch_tasks().await;
    assert!(tasks.accessor().error().is_none());
}

#[tokio::test]
async fn test_failed_result_serializes_without_data() {
    let context = StoreContext::new(Arc::new(FailingService), tenant_identity(TEST_COMPANY));
    let tasks = TaskStore::new(&context);
    let result = tasks.delete_task(3).await.unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["success"], json!(false));
    assert!(value.get("data").is_none());
    assert!(value["error"].as_str().unwrap().contains("permission denied"));
}

// ============================================================================
// State
// ============================================================================

#[tokio::test]
async fn test_state_starts_empty_and_is_not_fetched_on_construction() {
    let service = RecordingService::new().await;
    let context = StoreContext::new(service.clone(), tenant_identity(TEST_COMPANY));
    let tasks = TaskStore::new(&context);

    let state = tasks.accessor().state();
    assert!(state.items.is_empty() && state.item.is_none() && state.error.is_none());
    assert!(service.selects.lock().is_empty());
}

#[tokio::test]
async fn test_concurrent_creates_all_land_in_state() {
    let tasks = TaskStore::new(&memory_context(tenant_identity(TEST_COMPANY)).await);
    let accessor = tasks.accessor().clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let accessor = accessor.clone();
            tokio::spawn(async move {
                accessor
                    .create_item(&json!({"task_title": format!("Task {i}")}))
                    .await
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    assert_eq!(tasks.tasks().len(), 8);
    assert_eq!(tasks.fetch_tasks().await.len(), 8);
    assert!(!accessor.state().creating);
}

#[tokio::test]
async fn test_update_of_unlisted_record_does_not_append() {
    let tasks = TaskStore::new(&memory_context(tenant_identity(TEST_COMPANY)).await);
    let task: Task = tasks
        .accessor()
        .create_item(&json!({"task_title": "Hidden"}))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    // A fetch that does not include the task replaces the list
    tasks.fetch_completed_tasks().await;
    assert!(tasks.tasks().is_empty());

    tasks.reopen_task(task.id.unwrap()).await.unwrap();
    assert!(tasks.tasks().is_empty());
}

#[tokio::test]
async fn test_timeout_setting_is_carried_by_context() {
    let context = memory_context(tenant_identity(TEST_COMPANY))
        .await
        .with_settings(AccessorSettings {
            request_timeout_ms: 5_000,
        });
    let tasks = TaskStore::new(&context);
    assert!(tasks
        .accessor()
        .create_item(&json!({"task_title": "Fast enough"}))
        .await
        .unwrap()
        .success);
}
