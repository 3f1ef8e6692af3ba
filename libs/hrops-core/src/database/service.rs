//! The data service seam between the accessor and a backend
//!
//! Requests are structured rather than SQL so that any backend (or a test
//! double) can serve the accessor.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Record, RecordId};
use crate::query::{QueryFilters, QueryOptions};
use crate::scope::{ScopeClauses, TableSpec};

/// Read rows from one table
#[derive(Debug, Clone)]
pub struct SelectRequest {
    pub table: TableSpec,
    pub scope: ScopeClauses,
    pub filters: QueryFilters,
    pub options: QueryOptions,
}

/// Insert one row and return it
#[derive(Debug, Clone)]
pub struct InsertRequest {
    pub table: TableSpec,
    pub record: Record,
    /// Columns of the returned row; `None` returns all of them
    pub returning: Option<Vec<String>>,
}

/// Change some columns of the row with `id` inside `guard`
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub table: TableSpec,
    pub id: RecordId,
    pub guard: ScopeClauses,
    pub changes: Record,
}

/// Remove the row with `id` inside `guard`
#[derive(Debug, Clone)]
pub struct DeleteRequest {
    pub table: TableSpec,
    pub id: RecordId,
    pub guard: ScopeClauses,
}

/// Which backend call an operation maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceOperation {
    Select,
    Insert,
    Update,
    Delete,
}

impl ServiceOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Backend the entity accessor talks to
#[async_trait]
pub trait DataService: Send + Sync + Debug {
    /// Rows matching the request; single-row modes fetch at most two rows
    async fn select(&self, request: SelectRequest) -> Result<Vec<Record>>;

    /// The stored row
    async fn insert(&self, request: InsertRequest) -> Result<Record>;

    /// The updated row, or `None` if no row matched
    async fn update(&self, request: UpdateRequest) -> Result<Option<Record>>;

    /// The deleted id, or `None` if no row matched
    async fn delete(&self, request: DeleteRequest) -> Result<Option<RecordId>>;
}
