//! Application schema
//!
//! Timestamps are RFC 3339 text written by the accessor, dates are
//! `YYYY-MM-DD` text, user ids are UUID text and list-valued columns hold
//! JSON arrays.

/// Statements applied by [`super::HrOpsDatabase::migrate`], in order
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r"CREATE TABLE IF NOT EXISTS divisions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        head_id TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS departments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        division_id INTEGER REFERENCES divisions(id) ON DELETE SET NULL,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS grades (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS positions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        department_id INTEGER REFERENCES departments(id) ON DELETE SET NULL,
        grade_id INTEGER REFERENCES grades(id) ON DELETE SET NULL,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS sites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        address TEXT,
        latitude REAL,
        longitude REAL,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        task_title TEXT NOT NULL,
        task_description TEXT,
        assignees TEXT NOT NULL DEFAULT '[]',
        priority TEXT,
        start_date TEXT,
        end_date TEXT,
        department_id INTEGER,
        status INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS notices (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        department_id INTEGER,
        title TEXT NOT NULL,
        description TEXT,
        urgency TEXT,
        valid_from TEXT,
        valid_till TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS attendance (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        site_id INTEGER REFERENCES sites(id) ON DELETE SET NULL,
        attendance_date TEXT NOT NULL,
        check_in_time TEXT,
        check_out_time TEXT,
        tag TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS stakeholders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        status TEXT,
        contact_person TEXT,
        email TEXT,
        phone TEXT,
        address TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS stakeholder_issues (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        stakeholder_id INTEGER REFERENCES stakeholders(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT,
        priority TEXT,
        assignees TEXT NOT NULL DEFAULT '[]',
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS leave_requests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        leave_type TEXT,
        start_date TEXT,
        end_date TEXT,
        reason TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS requisitions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        item_name TEXT NOT NULL,
        quantity INTEGER,
        description TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT,
        updated_at TEXT
    )",
    r"CREATE TABLE IF NOT EXISTS settlements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL,
        user_id TEXT NOT NULL,
        amount REAL,
        description TEXT,
        event_date TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_company ON tasks(company_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_notices_company ON notices(company_id, department_id)",
    "CREATE INDEX IF NOT EXISTS idx_attendance_user ON attendance(company_id, user_id, attendance_date)",
    "CREATE INDEX IF NOT EXISTS idx_stakeholders_company ON stakeholders(company_id)",
    "CREATE INDEX IF NOT EXISTS idx_leave_user ON leave_requests(company_id, user_id)",
];

/// Tables created by the schema, for health reporting
pub const APPLICATION_TABLES: &[&str] = &[
    "tasks",
    "notices",
    "attendance",
    "stakeholders",
    "stakeholder_issues",
    "departments",
    "divisions",
    "grades",
    "positions",
    "sites",
    "leave_requests",
    "requisitions",
    "settlements",
];
