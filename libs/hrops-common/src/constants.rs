//! Constants shared across the HR ops crates

/// Default SQLite database filename
pub const DATABASE_FILENAME: &str = "hrops.sqlite";

/// Column holding the tenant (company) identifier
pub const COMPANY_COLUMN: &str = "company_id";

/// Column holding the owning user identifier
pub const USER_COLUMN: &str = "user_id";

/// Column holding the department identifier
pub const DEPARTMENT_COLUMN: &str = "department_id";

/// Primary key column of every application table
pub const ID_COLUMN: &str = "id";

/// Creation timestamp column
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Last modification timestamp column
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Largest page a command line listing asks for
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Default backend request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

/// Supported date formats
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];
