//! Daily attendance of the signed-in user

use chrono::{NaiveDate, Utc};
use hrops_common::{format_date, format_timestamp, today};
use serde_json::json;

use crate::accessor::{EntityAccessor, StoreContext};
use crate::error::Result;
use crate::models::{Attendance, RecordId};
use crate::query::{QueryFilters, QueryOptions, SortDirection};
use crate::scope::EntityConfig;
use crate::state::OperationResult;

/// Tag written by [`AttendanceStore::check_in`]
pub const PRESENT_TAG: &str = "Present";

/// The session user's own attendance entries
#[derive(Debug, Clone)]
pub struct AttendanceStore {
    accessor: EntityAccessor<Attendance>,
}

impl AttendanceStore {
    #[must_use]
    pub fn config() -> EntityConfig {
        EntityConfig::new("attendance", "Attendance")
            .company_scoped()
            .user_scoped()
    }

    #[must_use]
    pub fn new(context: &StoreContext) -> Self {
        Self {
            accessor: EntityAccessor::new(context, Self::config()),
        }
    }

    #[must_use]
    pub const fn accessor(&self) -> &EntityAccessor<Attendance> {
        &self.accessor
    }

    /// All entries, latest day first
    pub async fn fetch_attendance(&self) -> Vec<Attendance> {
        self.accessor
            .fetch_items_with_query(QueryFilters::new(), latest_first())
            .await
    }

    /// Today's entry; `None` means the user has not checked in
    pub async fn fetch_today_attendance(&self) -> Option<Attendance> {
        let filters = QueryFilters::builder()
            .eq("attendance_date", format_date(&today()))
            .build();
        self.accessor
            .fetch_single_with_query(filters, QueryOptions::new().maybe_single())
            .await
    }

    /// Entries between `from` and `to`, both inclusive
    pub async fn fetch_attendance_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<Attendance> {
        let filters = QueryFilters::builder()
            .gte("attendance_date", format_date(&from))
            .lte("attendance_date", format_date(&to))
            .build();
        self.accessor
            .fetch_items_with_query(filters, latest_first())
            .await
    }

    /// Open today's entry at `site_id`
    ///
    /// # Errors
    /// Returns an error if the company or user is unknown
    pub async fn check_in(&self, site_id: Option<RecordId>) -> Result<OperationResult<Attendance>> {
        let now = Utc::now();
        let payload = json!({
            "site_id": site_id,
            "attendance_date": format_date(&now.date_naive()),
            "check_in_time": format_timestamp(&now),
            "tag": PRESENT_TAG,
        });
        self.accessor.create_item(&payload).await
    }

    /// Close entry `id` with the current time
    ///
    /// # Errors
    /// Returns an error if no company is known
    pub async fn check_out(&self, id: RecordId) -> Result<OperationResult<Attendance>> {
        let payload = json!({ "check_out_time": format_timestamp(&Utc::now()) });
        self.accessor.update_item(id, &payload).await
    }
}

fn latest_first() -> QueryOptions {
    QueryOptions::new().order_by("attendance_date", SortDirection::Desc)
}
