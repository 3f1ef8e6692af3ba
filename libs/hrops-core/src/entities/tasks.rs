//! Tasks of a company

use serde_json::json;

use crate::accessor::{EntityAccessor, StoreContext};
use crate::error::Result;
use crate::models::{CreateTaskRequest, RecordId, Task, UpdateTaskRequest};
use crate::query::{QueryFilters, QueryOptions, SortDirection};
use crate::scope::EntityConfig;
use crate::state::OperationResult;

/// Company-scoped task list; `status` is `false` while a task is ongoing
#[derive(Debug, Clone)]
pub struct TaskStore {
    accessor: EntityAccessor<Task>,
}

impl TaskStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        EntityConfig::new("tasks", "Task")
            .company_scoped()
            .json_columns(&["assignees"])
            .bool_columns(&["status"])
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<Task> {
        &self.accessor
    }

    /// Tasks currently held by the store
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.accessor.items()
    }

    /// All tasks, newest first
    pub async fn fetch_tasks(&self) -> Vec<Task> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first())
            .await
    }

    /// The `limit` newest tasks
    pub async fn fetch_recent_tasks(&self, limit: usize) -> Vec<Task> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first().limit(limit))
            .await
    }

    pub async fn fetch_ongoing_tasks(&self) -> Vec<Task> {
        self.fetch_by_status(false, QueryFilters::new()).await
    }

    pub async fn fetch_completed_tasks(&self) -> Vec<Task> {
        self.fetch_by_status(true, QueryFilters::new()).await
    }

    /// Tasks whose assignee list includes `assignee`
    pub async fn fetch_assigned_tasks(&self, assignee: &str) -> Vec<Task> {
        self.accessor
            .fetch_items_with_query(assigned_to(assignee), newest_first())
            .await
    }

    /// Open tasks assigned to `assignee`
    pub async fn fetch_ongoing_assigned_tasks(&self, assignee: &str) -> Vec<Task> {
        self.fetch_by_status(false, assigned_to(assignee)).await
    }

    pub async fn fetch_task(&self, id: RecordId) -> Option<Task> {
        self.accessor.fetch_item(id).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<OperationResult<Task>> {
        self.accessor.create_item(request).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn update_task(
        &self,
        id: RecordId,
        request: &UpdateTaskRequest,
    ) -> Result<OperationResult<Task>> {
        self.accessor.update_item(id, request).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn complete_task(&self, id: RecordId) -> Result<OperationResult<Task>> {
        self.accessor.update_item(id, &json!({"status": true})).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn reopen_task(&self, id: RecordId) -> Result<OperationResult<Task>> {
        self.accessor.update_item(id, &json!({"status": false})).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn delete_task(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        self.accessor.delete_item(id).await
    }

    async fn fetch_by_status(&self, completed: bool, extra: QueryFilters) -> Vec<Task> {
        let mut filters = QueryFilters::builder().eq("status", completed).build();
        filters.merge(extra);
        self.accessor
            .fetch_items_with_query(filters, newest_first())
            .await
    }
}

fn assigned_to(assignee: &str) -> QueryFilters {
    QueryFilters::builder()
        .contains("assignees", [assignee])
        .build()
}

fn newest_first() -> QueryOptions {
    QueryOptions::new()
        .order_by("created_at", SortDirection::Desc)
        .order_by("id", SortDirection::Desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_context, tenant_identity};

    fn request(title: &str, assignees: &[&str]) -> CreateTaskRequest {
        CreateTaskRequest {
            task_title: title.to_string(),
            assignees: assignees.iter().map(ToString::to_string).collect(),
            priority: Some("high".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_config_flags() {
        let config = TaskStore::config();
        assert!(config.is_company_scoped());
        assert!(!config.is_user_scoped());
        assert!(config.table().is_json("assignees"));
        assert!(config.table().is_bool("status"));
    }

    #[tokio::test]
    async fn test_ongoing_and_completed_split() {
        let store = TaskStore::new(&memory_context(tenant_identity(42)).await);
        let first = store
            .create_task(&request("Review PR", &["u1"]))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        store
            .create_task(&request("Write report", &["u2"]))
            .await
            .unwrap();

        store.complete_task(first.id.unwrap()).await.unwrap();

        let ongoing = store.fetch_ongoing_tasks().await;
        assert_eq!(ongoing.len(), 1);
        assert_eq!(ongoing[0].task_title, "Write report");

        let completed = store.fetch_completed_tasks().await;
        assert_eq!(completed.len(), 1);
        assert!(completed[0].status);

        store.reopen_task(first.id.unwrap()).await.unwrap();
        assert_eq!(store.fetch_ongoing_tasks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_assigned_tasks() {
        let store = TaskStore::new(&memory_context(tenant_identity(42)).await);
        store
            .create_task(&request("Pair review", &["u1", "u2"]))
            .await
            .unwrap();
        store.create_task(&request("Solo", &["u2"])).await.unwrap();

        let mine = store.fetch_assigned_tasks("u1").await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].assignees, vec!["u1", "u2"]);
        assert_eq!(store.fetch_assigned_tasks("u2").await.len(), 2);
    }

    #[tokio::test]
    async fn test_recent_tasks_are_limited_newest_first() {
        let store = TaskStore::new(&memory_context(tenant_identity(42)).await);
        for title in ["First", "Second", "Third"] {
            store.create_task(&request(title, &[])).await.unwrap();
        }

        let recent = store.fetch_recent_tasks(2).await;
        let titles: Vec<_> = recent.iter().map(|t| t.task_title.as_str()).collect();
        assert_eq!(titles, vec!["Third", "Second"]);
        assert_eq!(store.tasks(), recent);
    }

    #[tokio::test]
    async fn test_ongoing_assigned_combines_both_filters() {
        let store = TaskStore::new(&memory_context(tenant_identity(42)).await);
        let done = store
            .create_task(&request("Done review", &["u1"]))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        store.create_task(&request("Open review", &["u1"])).await.unwrap();
        store.create_task(&request("Not mine", &["u2"])).await.unwrap();
        store.complete_task(done.id.unwrap()).await.unwrap();

        let open = store.fetch_ongoing_assigned_tasks("u1").await;
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].task_title, "Open review");
    }

    #[tokio::test]
    async fn test_update_task_is_partial() {
        let store = TaskStore::new(&memory_context(tenant_identity(42)).await);
        let task = store
            .create_task(&request("Review PR", &["u1"]))
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let updated = store
            .update_task(
                task.id.unwrap(),
                &UpdateTaskRequest {
                    priority: Some("low".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .into_result()
            .unwrap();

        assert_eq!(updated.priority.as_deref(), Some("low"));
        assert_eq!(updated.task_title, "Review PR");
        assert_eq!(updated.assignees, vec!["u1"]);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(store.tasks(), vec![updated]);
    }
}
