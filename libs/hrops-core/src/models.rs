//! Data models for HR operations entities
//!
//! Every domain record is structurally an [`EntityRecord`]: an optional
//! integer `id` plus optional `created_at`/`updated_at` timestamps. Fields
//! default when a projection leaves them out.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{HrOpsError, Result};

/// Primary key of every application table
pub type RecordId = i64;

/// Tenant (company) identifier
pub type CompanyId = i64;

/// Department identifier
pub type DepartmentId = i64;

/// Authenticated user identifier
pub type UserId = Uuid;

/// Schemaless row: column name to JSON value
pub type Record = Map<String, Value>;

/// Anything the entity accessor can load and store
pub trait EntityRecord:
    Serialize + DeserializeOwned + Clone + std::fmt::Debug + Send + Sync + 'static
{
    /// Primary key, if the record has been persisted
    fn id(&self) -> Option<RecordId>;
}

impl EntityRecord for Record {
    fn id(&self) -> Option<RecordId> {
        self.get(hrops_common::ID_COLUMN).and_then(Value::as_i64)
    }
}

/// Serialize a payload into a [`Record`]
///
/// # Errors
///
/// Returns a validation error if the payload does not serialize to a JSON object
pub fn to_record<P: Serialize + ?Sized>(payload: &P) -> Result<Record> {
    match serde_json::to_value(payload)? {
        Value::Object(map) => Ok(map),
        other => Err(HrOpsError::validation(format!(
            "Expected an object payload, got {other}"
        ))),
    }
}

/// Deserialize a [`Record`] into a typed entity
///
/// # Errors
///
/// Returns a serialization error if the row does not match `T`
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

macro_rules! impl_entity_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl EntityRecord for $ty {
                fn id(&self) -> Option<RecordId> {
                    self.id
                }
            }
        )+
    };
}

/// Approval state shared by leave, requisitions and settlements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Task assigned to one or more users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub task_title: String,
    pub task_description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub assignees: Vec<String>,
    pub priority: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub department_id: Option<DepartmentId>,
    /// `false` while ongoing, `true` once completed
    #[serde(deserialize_with = "null_as_default")]
    pub status: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub task_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<DepartmentId>,
}

/// Partial update of a task; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

/// Company notice, optionally targeted at one department
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notice {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    /// `None` publishes the notice to every department
    pub department_id: Option<DepartmentId>,
    pub title: String,
    pub description: Option<String>,
    pub urgency: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_till: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for publishing a notice
///
/// `department_id` left as `None` targets the author's department;
/// `Some(None)` publishes company-wide.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateNoticeRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_till: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Option<DepartmentId>>,
}

/// Daily attendance entry of one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attendance {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub site_id: Option<RecordId>,
    pub attendance_date: Option<NaiveDate>,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// External party (vendor, client, partner)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stakeholder {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub status: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Ticket raised against a stakeholder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeholderIssue {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub stakeholder_id: Option<RecordId>,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub assignees: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Leave application of one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveRequest {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub leave_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub status: ApprovalStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Purchase or asset requisition of one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requisition {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub item_name: String,
    pub quantity: Option<i64>,
    pub description: Option<String>,
    pub status: ApprovalStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Expense settlement claim of one user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settlement {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub status: ApprovalStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Department of a company
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Department {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub division_id: Option<RecordId>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Division grouping departments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Division {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub head_id: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Pay grade
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grade {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Job position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub department_id: Option<DepartmentId>,
    pub grade_id: Option<RecordId>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Work site where attendance is recorded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Site {
    pub id: Option<RecordId>,
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl_entity_record!(
    Task,
    Notice,
    Attendance,
    Stakeholder,
    StakeholderIssue,
    LeaveRequest,
    Requisition,
    Settlement,
    Department,
    Division,
    Grade,
    Position,
    Site,
);
