//! Leave requests, requisitions and settlements
//!
//! All three belong to the signed-in user and move through
//! [`ApprovalStatus`]. Approving or rejecting is guarded by the tenant only,
//! so an approver can act on a request by id.

use serde::Serialize;
use serde_json::json;

use crate::accessor::{EntityAccessor, StoreContext};
use crate::error::Result;
use crate::models::{ApprovalStatus, EntityRecord, LeaveRequest, RecordId, Requisition, Settlement};
use crate::query::{QueryFilters, QueryOptions, SortDirection};
use crate::scope::EntityConfig;
use crate::state::OperationResult;

fn owned_by_user(table: &str, entity: &str) -> EntityConfig {
    EntityConfig::new(table, entity).company_scoped().user_scoped()
}

fn newest_first() -> QueryOptions {
    QueryOptions::new()
        .order_by("created_at", SortDirection::Desc)
        .order_by("id", SortDirection::Desc)
}

async fn fetch_with_status<T: EntityRecord>(
    accessor: &EntityAccessor<T>,
    status: ApprovalStatus,
) -> Vec<T> {
    let filters = QueryFilters::builder().eq("status", status.as_str()).build();
    accessor.fetch_items_with_query(filters, newest_first()).await
}

async fn set_status<T: EntityRecord>(
    accessor: &EntityAccessor<T>,
    id: RecordId,
    status: ApprovalStatus,
) -> Result<OperationResult<T>> {
    accessor
        .update_item(id, &json!({ "status": status.as_str() }))
        .await
}

#[derive(Debug, Clone)]
pub struct LeaveStore {
    accessor: EntityAccessor<LeaveRequest>,
}

impl LeaveStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        owned_by_user("leave_requests", "Leave request")
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<LeaveRequest> {
        &self.accessor
    }

    pub async fn fetch_leave_requests(&self) -> Vec<LeaveRequest> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first())
            .await
    }

    pub async fn fetch_pending(&self) -> Vec<LeaveRequest> {
        fetch_with_status(&self.accessor, ApprovalStatus::Pending).await
    }

    /// # Errors
    /// Returns an error if the company or user is unknown
    pub async fn create_leave_request<P>(&self, payload: &P) -> Result<OperationResult<LeaveRequest>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.create_item(payload).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn approve(&self, id: RecordId) -> Result<OperationResult<LeaveRequest>> {
        set_status(&self.accessor, id, ApprovalStatus::Approved).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn reject(&self, id: RecordId) -> Result<OperationResult<LeaveRequest>> {
        set_status(&self.accessor, id, ApprovalStatus::Rejected).await
    }
}

#[derive(Debug, Clone)]
pub struct RequisitionStore {
    accessor: EntityAccessor<Requisition>,
}

impl RequisitionStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        owned_by_user("requisitions", "Requisition")
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<Requisition> {
        &self.accessor
    }

    pub async fn fetch_requisitions(&self) -> Vec<Requisition> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first())
            .await
    }

    pub async fn fetch_pending(&self) -> Vec<Requisition> {
        fetch_with_status(&self.accessor, ApprovalStatus::Pending).await
    }

    /// # Errors
    /// Returns an error if the company or user is unknown
    pub async fn create_requisition<P>(&self, payload: &P) -> Result<OperationResult<Requisition>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.create_item(payload).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn update_requisition<P>(
        &self,
        id: RecordId,
        changes: &P,
    ) -> Result<OperationResult<Requisition>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.update_item(id, changes).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn delete_requisition(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        self.accessor.delete_item(id).await
    }
}

#[derive(Debug, Clone)]
pub struct SettlementStore {
    accessor: EntityAccessor<Settlement>,
}

impl SettlementStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        owned_by_user("settlements", "Settlement")
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<Settlement> {
        &self.accessor
    }

    pub async fn fetch_settlements(&self) -> Vec<Settlement> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), newest_first())
            .await
    }

    pub async fn fetch_pending(&self) -> Vec<Settlement> {
        fetch_with_status(&self.accessor, ApprovalStatus::Pending).await
    }

    /// # Errors
    /// Returns an error if the company or user is unknown
    pub async fn create_settlement<P>(&self, payload: &P) -> Result<OperationResult<Settlement>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.create_item(payload).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn update_settlement<P>(
        &self,
        id: RecordId,
        changes: &P,
    ) -> Result<OperationResult<Settlement>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.update_item(id, changes).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn delete_settlement(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        self.accessor.delete_item(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::SessionIdentity;
    use crate::test_utils::{full_identity, memory_context, test_user};

    #[tokio::test]
    async fn test_leave_lifecycle() {
        let store = LeaveStore::new(&memory_context(full_identity()).await);
        let first = store
            .create_leave_request(&json!({"leave_type": "annual", "start_date": "2024-06-01"}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        let second = store
            .create_leave_request(&json!({"leave_type": "sick"}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(first.status, ApprovalStatus::Pending);
        assert_eq!(first.user_id, Some(test_user()));

        let approved = store.approve(first.id.unwrap()).await.unwrap().into_result().unwrap();
        assert_eq!(approved.status, ApprovalStatus::Approved);
        store.reject(second.id.unwrap()).await.unwrap();

        assert!(store.fetch_pending().await.is_empty());
        let all = store.fetch_leave_requests().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].status, ApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn test_requests_are_private_to_their_user() {
        let context = memory_context(full_identity()).await;
        let mine = RequisitionStore::new(&context);
        mine.create_requisition(&json!({"item_name": "Laptop", "quantity": 1}))
            .await
            .unwrap();

        let mut other = context.clone();
        let mut identity = full_identity().current();
        identity.user_id = Some(uuid::Uuid::new_v4());
        other.identity = SessionIdentity::new(identity);
        let theirs = RequisitionStore::new(&other);

        assert_eq!(mine.fetch_pending().await.len(), 1);
        assert!(theirs.fetch_pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_settlement_crud() {
        let store = SettlementStore::new(&memory_context(full_identity()).await);
        let claim = store
            .create_settlement(&json!({"amount": 125.5, "description": "Taxi"}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(claim.amount, Some(125.5));

        let updated = store
            .update_settlement(claim.id.unwrap(), &json!({"amount": 130.0}))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(updated.amount, Some(130.0));
        assert_eq!(store.fetch_settlements().await, vec![updated]);

        assert!(store.delete_settlement(claim.id.unwrap()).await.unwrap().success);
        assert!(store.fetch_pending().await.is_empty());
    }
}
