//! Test utilities and fixture data for HR Ops

use crate::accessor::StoreContext;
use crate::database::{schema::SCHEMA_STATEMENTS, HrOpsDatabase};
use crate::models::{CompanyId, DepartmentId, UserId};
use crate::scope::{IdentityContext, SessionIdentity};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Tenant that owns most fixture rows
pub const TEST_COMPANY: CompanyId = 42;

/// Second tenant, used to check isolation
pub const OTHER_COMPANY: CompanyId = 7;

/// Department of [`TEST_COMPANY`] the fixture user belongs to
pub const ENGINEERING: DepartmentId = 1;

/// Another department of [`TEST_COMPANY`]
pub const OPERATIONS: DepartmentId = 2;

/// Fixture user of [`TEST_COMPANY`]
pub const TEST_USER: &str = "550e8400-e29b-41d4-a716-446655440001";

/// Second user of [`TEST_COMPANY`]
pub const OTHER_USER: &str = "550e8400-e29b-41d4-a716-446655440002";

/// Parse [`TEST_USER`]
///
/// # Panics
/// Panics if UUID parsing fails (should not happen with hardcoded UUIDs)
#[must_use]
pub fn test_user() -> UserId {
    Uuid::parse_str(TEST_USER).unwrap()
}

/// Parse [`OTHER_USER`]
///
/// # Panics
/// Panics if UUID parsing fails (should not happen with hardcoded UUIDs)
#[must_use]
pub fn other_user() -> UserId {
    Uuid::parse_str(OTHER_USER).unwrap()
}

/// Session that only knows its tenant
#[must_use]
pub fn tenant_identity(company_id: CompanyId) -> SessionIdentity {
    SessionIdentity::new(IdentityContext::new(Some(company_id), None, None))
}

/// Fully resolved session of [`TEST_USER`] in [`ENGINEERING`]
#[must_use]
pub fn full_identity() -> SessionIdentity {
    SessionIdentity::new(IdentityContext::new(
        Some(TEST_COMPANY),
        Some(test_user()),
        Some(ENGINEERING),
    ))
}

/// Fresh migrated in-memory database
///
/// # Panics
/// Panics if the in-memory database cannot be created
pub async fn memory_database() -> HrOpsDatabase {
    HrOpsDatabase::in_memory().await.unwrap()
}

/// Store context over a fresh in-memory database
///
/// # Panics
/// Panics if the in-memory database cannot be created
pub async fn memory_context(identity: SessionIdentity) -> StoreContext {
    StoreContext::new(Arc::new(memory_database().await), identity)
}

/// Create a test database file with the schema and fixture rows
///
/// # Errors
/// Returns `HrOpsError::Database` if the database cannot be created
pub fn create_test_database<P: AsRef<Path>>(db_path: P) -> crate::Result<Connection> {
    let conn = Connection::open(db_path)?;
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    insert_test_data(&conn)?;
    Ok(conn)
}

/// Insert fixture rows into a migrated database
///
/// [`TEST_COMPANY`] gets two departments, three tasks (one completed), a
/// company-wide notice, one notice per department, and an attendance row
/// for each of its users. [`OTHER_COMPANY`] gets one task and one notice.
fn insert_test_data(conn: &Connection) -> crate::Result<()> {
    let now = "2024-05-01T08:00:00+00:00";

    conn.execute(
        "INSERT INTO divisions (id, company_id, name, created_at, updated_at)
         VALUES (1, ?1, 'Product', ?2, ?2)",
        params![TEST_COMPANY, now],
    )?;

    for (id, name) in [(ENGINEERING, "Engineering"), (OPERATIONS, "Operations")] {
        conn.execute(
            "INSERT INTO departments (id, company_id, division_id, name, created_at, updated_at)
             VALUES (?1, ?2, 1, ?3, ?4, ?4)",
            params![id, TEST_COMPANY, name, now],
        )?;
    }

    let tasks: [(CompanyId, &str, &str, bool); 4] = [
        (TEST_COMPANY, "Review PR", r#"["u1"]"#, false),
        (TEST_COMPANY, "Plan sprint", r#"["u1","u2"]"#, false),
        (TEST_COMPANY, "Ship release", r#"["u2"]"#, true),
        (OTHER_COMPANY, "Audit books", "[]", false),
    ];
    for (company_id, title, assignees, done) in tasks {
        conn.execute(
            "INSERT INTO tasks (company_id, task_title, assignees, priority, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'high', ?4, ?5, ?5)",
            params![company_id, title, assignees, done, now],
        )?;
    }

    let notices: [(CompanyId, Option<DepartmentId>, &str); 4] = [
        (TEST_COMPANY, None, "Office closed Friday"),
        (TEST_COMPANY, Some(ENGINEERING), "Code freeze"),
        (TEST_COMPANY, Some(OPERATIONS), "Inventory count"),
        (OTHER_COMPANY, None, "Welcome"),
    ];
    for (company_id, department_id, title) in notices {
        conn.execute(
            "INSERT INTO notices (company_id, department_id, title, urgency, valid_from, created_at, updated_at)
             VALUES (?1, ?2, ?3, 'normal', '2024-05-01', ?4, ?4)",
            params![company_id, department_id, title, now],
        )?;
    }

    for user in [TEST_USER, OTHER_USER] {
        conn.execute(
            "INSERT INTO attendance (company_id, user_id, attendance_date, check_in_time, tag, created_at, updated_at)
             VALUES (?1, ?2, '2024-05-01', ?3, 'Present', ?3, ?3)",
            params![TEST_COMPANY, user, now],
        )?;
    }

    Ok(())
}
