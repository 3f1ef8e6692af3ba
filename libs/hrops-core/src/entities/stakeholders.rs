//! Stakeholders and the issues raised against them

use serde::Serialize;

use crate::accessor::{EntityAccessor, StoreContext};
use crate::error::Result;
use crate::models::{RecordId, Stakeholder, StakeholderIssue};
use crate::query::{QueryFilters, QueryOptions, SortDirection};
use crate::scope::EntityConfig;
use crate::state::OperationResult;

#[derive(Debug, Clone)]
pub struct StakeholderStore {
    accessor: EntityAccessor<Stakeholder>,
}

impl StakeholderStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        EntityConfig::new("stakeholders", "Stakeholder").company_scoped()
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<Stakeholder> {
        &self.accessor
    }

    #[must_use]
    pub fn stakeholders(&self) -> Vec<Stakeholder> {
        self.accessor.items()
    }

    pub async fn fetch_stakeholders(&self) -> Vec<Stakeholder> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), by_name())
            .await
    }

    pub async fn fetch_by_status(&self, status: &str) -> Vec<Stakeholder> {
        let filters = QueryFilters::builder().eq("status", status).build();
        self.accessor.fetch_items_with_query(filters, by_name()).await
    }

    /// Case-insensitive substring match on the name
    pub async fn search_stakeholders(&self, term: &str) -> Vec<Stakeholder> {
        let filters = QueryFilters::builder()
            .ilike("name", format!("%{}%", term.trim()))
            .build();
        self.accessor.fetch_items_with_query(filters, by_name()).await
    }

    pub async fn fetch_stakeholder(&self, id: RecordId) -> Option<Stakeholder> {
        self.accessor.fetch_item(id).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn create_stakeholder<P>(&self, payload: &P) -> Result<OperationResult<Stakeholder>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.create_item(payload).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn update_stakeholder<P>(
        &self,
        id: RecordId,
        changes: &P,
    ) -> Result<OperationResult<Stakeholder>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.update_item(id, changes).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn delete_stakeholder(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        self.accessor.delete_item(id).await
    }
}

/// Issues of every stakeholder of the company
#[derive(Debug, Clone)]
pub struct StakeholderIssueStore {
    accessor: EntityAccessor<StakeholderIssue>,
}

impl StakeholderIssueStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        EntityConfig::new("stakeholder_issues", "Stakeholder issue")
            .company_scoped()
            .json_columns(&["assignees"])
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<StakeholderIssue> {
        &self.accessor
    }

    /// Issues of one stakeholder, newest first
    pub async fn fetch_issues(&self, stakeholder_id: RecordId) -> Vec<StakeholderIssue> {
        let filters = QueryFilters::builder()
            .eq("stakeholder_id", stakeholder_id)
            .build();
        let options = QueryOptions::new().order_by("created_at", SortDirection::Desc);
        self.accessor.fetch_items_with_query(filters, options).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn create_issue<P>(&self, payload: &P) -> Result<OperationResult<StakeholderIssue>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.create_item(payload).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn update_issue<P>(
        &self,
        id: RecordId,
        changes: &P,
    ) -> Result<OperationResult<StakeholderIssue>>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.accessor.update_item(id, changes).await
    }

    /// # Errors
    /// Returns an error if no company is known
    pub async fn delete_issue(&self, id: RecordId) -> Result<OperationResult<RecordId>> {
        self.accessor.delete_item(id).await
    }
}

fn by_name() -> QueryOptions {
    QueryOptions::new().order_by("name", SortDirection::Asc)
}
