//! Company notices, optionally targeted at a department

use serde_json::Value;

use crate::accessor::{EntityAccessor, StoreContext};
use crate::error::Result;
use crate::models::{CreateNoticeRequest, Notice, RecordId};
use crate::query::{QueryFilters, QueryOptions, SortDirection};
use crate::scope::EntityConfig;
use crate::state::OperationResult;

/// Notices visible to the session's department, company-wide ones included
#[derive(Debug, Clone)]
pub struct NoticeStore {
    accessor: EntityAccessor<Notice>,
}

impl NoticeStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        EntityConfig::new("notices", "Notice")
            .company_scoped()
            .department_scoped()
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<Notice> {
        &self.accessor
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.accessor.items()
    }

    /// Every visible notice, newest first
    pub async fn fetch_notices(&self) -> Vec<Notice> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first())
            .await
    }

    /// The `limit` most recent visible notices
    pub async fn fetch_recent_notices(&self, limit: usize) -> Vec<Notice> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first().limit(limit))
            .await
    }

    pub async fn fetch_notice(&self, id: RecordId) -> Option<Notice> {
        self.accessor.fetch_item(id).await
    }

    /// Publish a notice
    ///
    /// Without a `department_id` the notice targets the author's department.
    ///
    /// # Errors
    /// Returns an error if the company is unknown, or the department is
    /// unknown and the request does not name one
    pub async fn create_notice(
        &self,
        request: &CreateNoticeRequest,
    ) -> Result<OperationResult<Notice>> {
        self.accessor.create_item(request).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn update_notice(&self, id: RecordId, changes: &Value) -> Result<OperationResult<Notice>> {
        self.accessor.update_item(id, changes).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn delete_notice(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        self.accessor.delete_item(id).await
    }
}

fn newest_first() -> QueryOptions {
    QueryOptions::new()
        .order_by("created_at", SortDirection::Desc)
        .order_by("id", SortDirection::Desc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{full_identity, memory_context, tenant_identity, ENGINEERING};
    use serde_json::json;

    fn notice(title: &str) -> CreateNoticeRequest {
        CreateNoticeRequest {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_default_target_is_own_department() {
        let store = NoticeStore::new(&memory_context(full_identity()).await);
        let created = store
            .create_notice(&notice("Standup moved"))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(created.department_id, Some(ENGINEERING));

        let global = store
            .create_notice(&CreateNoticeRequest {
                department_id: Some(None),
                ..notice("Holiday")
            })
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(global.department_id, None);
        assert_eq!(store.fetch_notices().await.len(), 2);
    }

    #[tokio::test]
    async fn test_recent_notices_are_limited() {
        let store = NoticeStore::new(&memory_context(full_identity()).await);
        for title in ["one", "two", "three"] {
            store.create_notice(&notice(title)).await.unwrap();
        }

        let recent = store.fetch_recent_notices(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "three");
        assert_eq!(store.notices(), recent);
    }

    #[tokio::test]
    async fn test_no_department_means_no_notices() {
        let store = NoticeStore::new(&memory_context(tenant_identity(42)).await);
        assert!(store.fetch_notices().await.is_empty());

        let error = store.create_notice(&notice("x")).await.unwrap_err();
        assert!(error.is_missing_identity());

        // Naming the target explicitly needs only the tenant
        let global = store
            .create_notice(&CreateNoticeRequest {
                department_id: Some(None),
                ..notice("All hands")
            })
            .await
            .unwrap();
        assert!(global.success);
    }

    #[tokio::test]
    async fn test_update_and_delete_notice() {
        let store = NoticeStore::new(&memory_context(full_identity()).await);
        let id = store
            .create_notice(&notice("Draft"))
            .await
            .unwrap()
            .into_result()
            .unwrap()
            .id
            .unwrap();

        let updated = store
            .update_notice(id, &json!({"urgency": "high"}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(updated.urgency.as_deref(), Some("high"));
        assert_eq!(store.fetch_notice(id).await, Some(updated));

        assert!(store.delete_notice(id).await.unwrap().success);
        assert!(store.fetch_notice(id).await.is_none());
    }
}
