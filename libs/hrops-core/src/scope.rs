//! Tenant, user and department scoping
//!
//! An [`EntityConfig`] declares which scoping columns a collection carries.
//! The [`ScopeResolver`] combines it with the caller's [`IdentityContext`]:
//! reads get extra predicates (or become [`ReadScope::Unavailable`] when an
//! id is missing), writes get the scoping columns filled in (or fail).

use std::sync::Arc;

use chrono::Utc;
use hrops_common::{
    format_timestamp, COMPANY_COLUMN, CREATED_AT_COLUMN, DEPARTMENT_COLUMN, UPDATED_AT_COLUMN,
    USER_COLUMN,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HrOpsError, Result};
use crate::models::{CompanyId, DepartmentId, Record, UserId};

/// Physical layout hints for one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    /// Columns stored as JSON text and decoded into arrays/objects
    pub json_columns: Vec<String>,
    /// Integer 0/1 columns decoded into booleans
    pub bool_columns: Vec<String>,
    /// Whether the table carries `created_at`/`updated_at`
    pub timestamps: bool,
}

impl TableSpec {
    #[must_use]
    pub fn is_json(&self, column: &str) -> bool {
        self.json_columns.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn is_bool(&self, column: &str) -> bool {
        self.bool_columns.iter().any(|c| c == column)
    }
}

/// Per-collection configuration, fixed for the accessor's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityConfig {
    table: TableSpec,
    entity_name: String,
    company_scoped: bool,
    user_scoped: bool,
    department_scoped: bool,
}

impl EntityConfig {
    /// Unscoped collection over `table_name`; `entity_name` labels errors and logs
    #[must_use]
    pub fn new(table_name: impl Into<String>, entity_name: impl Into<String>) -> Self {
        Self {
            table: TableSpec {
                name: table_name.into(),
                json_columns: Vec::new(),
                bool_columns: Vec::new(),
                timestamps: true,
            },
            entity_name: entity_name.into(),
            company_scoped: false,
            user_scoped: false,
            department_scoped: false,
        }
    }

    #[must_use]
    pub const fn company_scoped(mut self) -> Self {
        self.company_scoped = true;
        self
    }

    #[must_use]
    pub const fn user_scoped(mut self) -> Self {
        self.user_scoped = true;
        self
    }

    #[must_use]
    pub const fn department_scoped(mut self) -> Self {
        self.department_scoped = true;
        self
    }

    #[must_use]
    pub fn json_columns(mut self, columns: &[&str]) -> Self {
        self.table.json_columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn bool_columns(mut self, columns: &[&str]) -> Self {
        self.table.bool_columns = columns.iter().map(ToString::to_string).collect();
        self
    }

    /// The table has no `created_at`/`updated_at` columns
    #[must_use]
    pub const fn without_timestamps(mut self) -> Self {
        self.table.timestamps = false;
        self
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    #[must_use]
    pub const fn table(&self) -> &TableSpec {
        &self.table
    }

    #[must_use]
    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    #[must_use]
    pub const fn is_company_scoped(&self) -> bool {
        self.company_scoped
    }

    #[must_use]
    pub const fn is_user_scoped(&self) -> bool {
        self.user_scoped
    }

    #[must_use]
    pub const fn is_department_scoped(&self) -> bool {
        self.department_scoped
    }
}

/// Identity of the caller as known to the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    pub department_id: Option<DepartmentId>,
}

impl IdentityContext {
    #[must_use]
    pub const fn new(
        company_id: Option<CompanyId>,
        user_id: Option<UserId>,
        department_id: Option<DepartmentId>,
    ) -> Self {
        Self {
            company_id,
            user_id,
            department_id,
        }
    }
}

/// Shared, updatable identity handle
///
/// Cloned into every accessor; an auth layer fills it in once the session is
/// resolved, and reads issued before that degrade to empty results.
#[derive(Debug, Clone, Default)]
pub struct SessionIdentity {
    inner: Arc<RwLock<IdentityContext>>,
}

impl SessionIdentity {
    #[must_use]
    pub fn new(context: IdentityContext) -> Self {
        Self {
            inner: Arc::new(RwLock::new(context)),
        }
    }

    /// Identity with nothing resolved yet
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Snapshot of the current identity
    #[must_use]
    pub fn current(&self) -> IdentityContext {
        self.inner.read().clone()
    }

    pub fn set(&self, context: IdentityContext) {
        *self.inner.write() = context;
    }

    pub fn set_company(&self, company_id: Option<CompanyId>) {
        self.inner.write().company_id = company_id;
    }

    pub fn set_user(&self, user_id: Option<UserId>) {
        self.inner.write().user_id = user_id;
    }

    pub fn set_department(&self, department_id: Option<DepartmentId>) {
        self.inner.write().department_id = department_id;
    }

    /// Forget everything (sign-out)
    pub fn clear(&self) {
        self.set(IdentityContext::default());
    }
}

/// Scoping predicates added to a statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeClauses {
    /// `company_id = ?`
    pub company_id: Option<CompanyId>,
    /// `user_id = ?`
    pub user_id: Option<UserId>,
    /// `(department_id = ? OR department_id IS NULL)`
    pub department_id: Option<DepartmentId>,
}

impl ScopeClauses {
    /// No scoping at all
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.company_id.is_none() && self.user_id.is_none() && self.department_id.is_none()
    }
}

/// Outcome of resolving a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadScope {
    Scoped(ScopeClauses),
    /// A required id is not known yet; the read yields nothing
    Unavailable { missing: &'static str },
}

/// Applies an [`EntityConfig`] to one identity snapshot
#[derive(Debug, Clone)]
pub struct ScopeResolver<'a> {
    config: &'a EntityConfig,
    identity: IdentityContext,
}

impl<'a> ScopeResolver<'a> {
    #[must_use]
    pub const fn new(config: &'a EntityConfig, identity: IdentityContext) -> Self {
        Self { config, identity }
    }

    /// Use `company_id` instead of the session's tenant for this resolution
    #[must_use]
    pub fn with_company_override(mut self, company_id: Option<CompanyId>) -> Self {
        if company_id.is_some() {
            self.identity.company_id = company_id;
        }
        self
    }

    /// Predicates for a read
    #[must_use]
    pub fn read(&self) -> ReadScope {
        match self.clauses() {
            Ok(clauses) => ReadScope::Scoped(clauses),
            Err(missing) => ReadScope::Unavailable { missing },
        }
    }

    /// Predicates guarding an update or delete by id
    ///
    /// Only the tenant is enforced: a row of another company can never be
    /// touched by guessing its id.
    ///
    /// # Errors
    ///
    /// Returns [`HrOpsError::MissingIdentity`] if the collection is company
    /// scoped and no company is known
    pub fn guard(&self) -> Result<ScopeClauses> {
        let mut clauses = ScopeClauses::none();
        if self.config.is_company_scoped() {
            clauses.company_id = Some(self.require_company()?);
        }
        Ok(clauses)
    }

    /// Fill the scoping columns of a new record
    ///
    /// Company and user ids always overwrite caller-supplied values. The
    /// department id does too, except for an explicit `null`, which publishes
    /// the record to every department.
    ///
    /// # Errors
    ///
    /// Returns [`HrOpsError::MissingIdentity`] if a required id is not known
    pub fn write(&self, mut record: Record) -> Result<Record> {
        if self.config.is_company_scoped() {
            let company_id = self.require_company()?;
            record.insert(COMPANY_COLUMN.to_string(), Value::from(company_id));
        }
        if self.config.is_user_scoped() {
            let user_id = self.identity.user_id.ok_or_else(|| {
                HrOpsError::missing_identity(self.config.entity_name(), USER_COLUMN)
            })?;
            record.insert(USER_COLUMN.to_string(), Value::from(user_id.to_string()));
        }
        let global = record.get(DEPARTMENT_COLUMN).is_some_and(Value::is_null);
        if self.config.is_department_scoped() && !global {
            let department_id = self.identity.department_id.ok_or_else(|| {
                HrOpsError::missing_identity(self.config.entity_name(), DEPARTMENT_COLUMN)
            })?;
            record.insert(DEPARTMENT_COLUMN.to_string(), Value::from(department_id));
        }
        if self.config.table().timestamps {
            let now = Value::from(format_timestamp(&Utc::now()));
            let created_at = record
                .entry(CREATED_AT_COLUMN.to_string())
                .or_insert(Value::Null);
            if created_at.is_null() {
                *created_at = now.clone();
            }
            record.insert(UPDATED_AT_COLUMN.to_string(), now);
        }
        Ok(record)
    }

    fn require_company(&self) -> Result<CompanyId> {
        self.identity
            .company_id
            .ok_or_else(|| HrOpsError::missing_identity(self.config.entity_name(), COMPANY_COLUMN))
    }

    fn clauses(&self) -> std::result::Result<ScopeClauses, &'static str> {
        let mut clauses = ScopeClauses::none();
        if self.config.is_company_scoped() {
            clauses.company_id = Some(self.identity.company_id.ok_or(COMPANY_COLUMN)?);
        }
        if self.config.is_user_scoped() {
            clauses.user_id = Some(self.identity.user_id.ok_or(USER_COLUMN)?);
        }
        if self.config.is_department_scoped() {
            clauses.department_id = Some(self.identity.department_id.ok_or(DEPARTMENT_COLUMN)?);
        }
        Ok(clauses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::to_record;
    use serde_json::json;
    use uuid::Uuid;

    fn full_identity() -> IdentityContext {
        IdentityContext::new(Some(42), Some(Uuid::new_v4()), Some(7))
    }

    #[test]
    fn test_config_flags_and_columns() {
        let config = EntityConfig::new("tasks", "Task")
            .company_scoped()
            .json_columns(&["assignees"])
            .bool_columns(&["status"]);

        assert_eq!(config.table_name(), "tasks");
        assert_eq!(config.entity_name(), "Task");
        assert!(config.is_company_scoped());
        assert!(!config.is_user_scoped());
        assert!(!config.is_department_scoped());
        assert!(config.table().is_json("assignees"));
        assert!(config.table().is_bool("status"));
        assert!(!config.table().is_bool("assignees"));
        assert!(config.table().timestamps);
    }

    #[test]
    fn test_unscoped_read_needs_nothing() {
        let config = EntityConfig::new("grades", "Grade");
        let resolver = ScopeResolver::new(&config, IdentityContext::default());
        assert_eq!(resolver.read(), ReadScope::Scoped(ScopeClauses::none()));
    }

    #[test]
    fn test_company_read_without_company_is_unavailable() {
        let config = EntityConfig::new("tasks", "Task").company_scoped();
        let resolver = ScopeResolver::new(&config, IdentityContext::default());
        assert_eq!(
            resolver.read(),
            ReadScope::Unavailable {
                missing: COMPANY_COLUMN
            }
        );
    }

    #[test]
    fn test_company_override_fills_missing_company() {
        let config = EntityConfig::new("tasks", "Task").company_scoped();
        let resolver = ScopeResolver::new(&config, IdentityContext::default())
            .with_company_override(Some(5));
        match resolver.read() {
            ReadScope::Scoped(clauses) => assert_eq!(clauses.company_id, Some(5)),
            ReadScope::Unavailable { .. } => panic!("override should resolve the tenant"),
        }
    }

    #[test]
    fn test_all_flags_read() {
        let identity = full_identity();
        let config = EntityConfig::new("notices", "Notice")
            .company_scoped()
            .user_scoped()
            .department_scoped();
        let resolver = ScopeResolver::new(&config, identity.clone());

        assert_eq!(
            resolver.read(),
            ReadScope::Scoped(ScopeClauses {
                company_id: Some(42),
                user_id: identity.user_id,
                department_id: Some(7),
            })
        );
    }

    #[test]
    fn test_department_read_without_department_is_unavailable() {
        let config = EntityConfig::new("notices", "Notice").department_scoped();
        let identity = IdentityContext::new(Some(1), None, None);
        let resolver = ScopeResolver::new(&config, identity);
        assert_eq!(
            resolver.read(),
            ReadScope::Unavailable {
                missing: DEPARTMENT_COLUMN
            }
        );
    }

    #[test]
    fn test_write_injects_scoping_columns() {
        let identity = full_identity();
        let config = EntityConfig::new("attendance", "Attendance")
            .company_scoped()
            .user_scoped();
        let resolver = ScopeResolver::new(&config, identity.clone());

        let record = resolver
            .write(to_record(&json!({"company_id": 999, "tag": "Present"})).unwrap())
            .unwrap();

        assert_eq!(record.get(COMPANY_COLUMN), Some(&json!(42)));
        assert_eq!(
            record.get(USER_COLUMN),
            Some(&json!(identity.user_id.unwrap().to_string()))
        );
        assert!(record.contains_key(CREATED_AT_COLUMN));
        assert!(record.contains_key(UPDATED_AT_COLUMN));
    }

    #[test]
    fn test_write_without_company_fails_loud() {
        let config = EntityConfig::new("tasks", "Task").company_scoped();
        let resolver = ScopeResolver::new(&config, IdentityContext::default());
        let error = resolver.write(Record::new()).unwrap_err();
        assert!(error.is_missing_identity());
    }

    #[test]
    fn test_write_without_user_fails_loud() {
        let config = EntityConfig::new("leave_requests", "Leave").user_scoped();
        let resolver = ScopeResolver::new(&config, IdentityContext::new(Some(1), None, None));
        match resolver.write(Record::new()) {
            Err(HrOpsError::MissingIdentity { field, .. }) => assert_eq!(field, USER_COLUMN),
            other => panic!("Expected MissingIdentity, got {other:?}"),
        }
    }

    #[test]
    fn test_write_keeps_explicit_null_department() {
        let config = EntityConfig::new("notices", "Notice")
            .company_scoped()
            .department_scoped();
        let resolver = ScopeResolver::new(&config, full_identity());

        let global = resolver
            .write(to_record(&json!({"title": "Holiday", "department_id": null})).unwrap())
            .unwrap();
        assert_eq!(global.get(DEPARTMENT_COLUMN), Some(&Value::Null));

        let targeted = resolver
            .write(to_record(&json!({"title": "Standup"})).unwrap())
            .unwrap();
        assert_eq!(targeted.get(DEPARTMENT_COLUMN), Some(&json!(7)));
    }

    #[test]
    fn test_write_pins_other_department_to_caller() {
        let config = EntityConfig::new("notices", "Notice")
            .company_scoped()
            .department_scoped();
        let resolver = ScopeResolver::new(&config, full_identity());

        let record = resolver
            .write(to_record(&json!({"title": "Standup", "department_id": 99})).unwrap())
            .unwrap();
        assert_eq!(record.get(DEPARTMENT_COLUMN), Some(&json!(7)));

        let anonymous = ScopeResolver::new(&config, IdentityContext::new(Some(42), None, None));
        let error = anonymous
            .write(to_record(&json!({"title": "Standup", "department_id": 99})).unwrap())
            .unwrap_err();
        assert!(error.is_missing_identity());
    }

    #[test]
    fn test_write_without_timestamps() {
        let config = EntityConfig::new("plain", "Plain").without_timestamps();
        let resolver = ScopeResolver::new(&config, IdentityContext::default());
        let record = resolver.write(Record::new()).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_guard_only_enforces_company() {
        let config = EntityConfig::new("attendance", "Attendance")
            .company_scoped()
            .user_scoped();
        let resolver = ScopeResolver::new(&config, full_identity());
        let guard = resolver.guard().unwrap();
        assert_eq!(guard.company_id, Some(42));
        assert!(guard.user_id.is_none());

        let anonymous = ScopeResolver::new(&config, IdentityContext::default());
        assert!(anonymous.guard().unwrap_err().is_missing_identity());
    }

    #[test]
    fn test_session_identity_is_shared() {
        let session = SessionIdentity::anonymous();
        let clone = session.clone();

        clone.set_company(Some(42));
        clone.set_department(Some(3));
        assert_eq!(session.current().company_id, Some(42));
        assert_eq!(session.current().department_id, Some(3));

        session.clear();
        assert_eq!(clone.current(), IdentityContext::default());
    }
}
