//! In-memory state of one entity collection and mutation results

use serde::{Deserialize, Serialize};

use crate::error::HrOpsError;
use crate::models::{EntityRecord, RecordId};

/// Snapshot of what an accessor currently holds
///
/// Built empty, filled only by explicit fetches and spliced by mutations.
/// The flags are independent; there is no combined "busy" state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionState<T> {
    pub items: Vec<T>,
    /// The "current" record set by single-record reads
    pub item: Option<T>,
    /// A read is in flight
    pub loading: bool,
    pub creating: bool,
    pub updating: bool,
    pub deleting: bool,
    /// Message of the last failed operation
    pub error: Option<String>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            item: None,
            loading: false,
            creating: false,
            updating: false,
            deleting: false,
            error: None,
        }
    }
}

impl<T: EntityRecord> CollectionState<T> {
    /// Append a created record, or replace it if the id is already listed
    pub(crate) fn upsert(items: &mut Vec<T>, record: &T) {
        match record
            .id()
            .and_then(|id| items.iter().position(|i| i.id() == Some(id)))
        {
            Some(index) => items[index] = record.clone(),
            None => items.push(record.clone()),
        }
    }

    /// Replace the listed record with the same id; unlisted records are ignored
    pub(crate) fn replace(items: &mut [T], record: &T) {
        if let Some(id) = record.id() {
            for entry in items.iter_mut().filter(|i| i.id() == Some(id)) {
                *entry = record.clone();
            }
        }
    }

    pub(crate) fn remove(items: &mut Vec<T>, id: RecordId) {
        items.retain(|i| i.id() != Some(id));
    }
}

/// Outcome of a create, update or delete, serialized as `{success, data?, error?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult<D> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<D> OperationResult<D> {
    #[must_use]
    pub const fn ok(data: D) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Transform the payload of a successful result
    pub fn map<U>(self, f: impl FnOnce(D) -> U) -> OperationResult<U> {
        OperationResult {
            success: self.success,
            data: self.data.map(f),
            error: self.error,
        }
    }

    /// Convert into a `Result`, turning a failure into [`HrOpsError::Unknown`]
    ///
    /// # Errors
    /// Returns the stored message if the operation failed
    pub fn into_result(self) -> crate::error::Result<D> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(HrOpsError::unknown(
                self.error
                    .unwrap_or_else(|| "operation returned no data".to_string()),
            )),
        }
    }
}

impl<D> From<HrOpsError> for OperationResult<D> {
    fn from(error: HrOpsError) -> Self {
        Self::failed(error.to_string())
    }
}
