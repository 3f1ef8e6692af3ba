//! HR Ops CLI library
//!
//! Argument parsing and command execution for the `hrops` binary. Every
//! command goes through the same scoped stores an application would use, so
//! the CLI doubles as a way to inspect what a given identity can see.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use hrops_common::{parse_date, MAX_QUERY_LIMIT};
use hrops_core::{
    load_config, load_config_from_file, AttendanceStore, CreateNoticeRequest, CreateTaskRequest,
    DatabasePoolConfig, DepartmentStore, HrOpsConfig, HrOpsDatabase, NoticeStore,
    SessionIdentity, StoreContext, TaskStore,
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "hrops")]
#[command(about = "Scoped access to the HR operations database")]
#[command(version)]
pub struct Cli {
    /// Database file (overrides the configured URL)
    #[arg(long, short, global = true)]
    pub database: Option<PathBuf>,

    /// Configuration file (YAML or JSON)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Company (tenant) id of the session
    #[arg(long, global = true)]
    pub company: Option<i64>,

    /// User id of the session
    #[arg(long, global = true)]
    pub user: Option<Uuid>,

    /// Department id of the session
    #[arg(long, global = true)]
    pub department: Option<i64>,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create the application tables
    Migrate,
    /// Tasks of the company
    Tasks {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Notices visible to the department
    Notices {
        #[command(subcommand)]
        action: NoticeCommand,
    },
    /// Attendance of the user
    Attendance {
        #[command(subcommand)]
        action: AttendanceCommand,
    },
    /// Departments of the company
    Departments {
        #[command(subcommand)]
        action: DepartmentCommand,
    },
    /// Connection status and row counts
    Health,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum TaskCommand {
    /// All tasks, newest first
    List {
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Tasks not yet completed
    Ongoing {
        /// Only tasks assigned to this user
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Create a task
    Create(CreateTaskArgs),
    /// Mark a task completed
    Complete { id: i64 },
    /// Delete a task
    Delete { id: i64 },
}

#[derive(Args, Debug, PartialEq, Eq)]
pub struct CreateTaskArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Assignee (repeatable)
    #[arg(long = "assignee")]
    pub assignees: Vec<String>,
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum NoticeCommand {
    /// Visible notices, newest first
    List {
        /// Limit number of results
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Publish a notice to the session's department
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        urgency: Option<String>,
        /// Publish to every department
        #[arg(long)]
        global: bool,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum AttendanceCommand {
    /// Today's entry, if any
    Today,
    /// Open today's entry
    CheckIn {
        #[arg(long)]
        site: Option<i64>,
    },
    /// Close an entry
    CheckOut { id: i64 },
    /// Entries between two dates, both inclusive
    Range {
        /// First day (YYYY-MM-DD, MM/DD/YYYY or DD/MM/YYYY)
        from: String,
        /// Last day
        to: String,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum DepartmentCommand {
    /// All departments, by name
    List,
    /// Create a department
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
}

/// Load configuration and apply the command line on top of it
///
/// # Errors
/// Returns an error if a configuration file is invalid
pub fn build_config(cli: &Cli) -> anyhow::Result<HrOpsConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => load_config().context("Failed to load configuration")?,
    };

    if let Some(path) = &cli.database {
        config.database.url = format!("sqlite://{}", path.display());
    }
    if cli.company.is_some() {
        config.identity.company_id = cli.company;
    }
    if cli.user.is_some() {
        config.identity.user_id = cli.user;
    }
    if cli.department.is_some() {
        config.identity.department_id = cli.department;
    }
    if cli.verbose {
        config.logging.log_level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json_logs = true;
    }
    Ok(config)
}

/// Connect to the configured database
///
/// In-memory databases are migrated right away since they start empty.
///
/// # Errors
/// Returns an error if the connection fails
pub async fn open_database(config: &HrOpsConfig) -> anyhow::Result<HrOpsDatabase> {
    let settings = &config.database;
    if settings.is_memory() {
        return HrOpsDatabase::in_memory()
            .await
            .context("Failed to open in-memory database");
    }
    let pool_config: DatabasePoolConfig = settings.pool_config();
    HrOpsDatabase::from_connection_string_with_config(&settings.url, pool_config)
        .await
        .with_context(|| format!("Failed to open {}", settings.url))
}

/// Write `value` as pretty JSON followed by a newline
///
/// # Errors
/// Returns an error if serialization or writing fails
pub fn print_json<T: Serialize + ?Sized, W: Write>(value: &T, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Print connection status and table row counts
///
/// # Errors
/// Returns an error if the database is not reachable or not migrated
pub async fn health_check<W: Write>(db: &HrOpsDatabase, writer: &mut W) -> anyhow::Result<()> {
    let pool = db.get_pool_health().await;
    if !pool.is_healthy {
        bail!("Database is not connected");
    }
    let stats = db.get_stats().await?;
    print_json(
        &json!({
            "pool": pool,
            "tables": stats.table_counts,
            "total_rows": stats.total_rows(),
        }),
        writer,
    )
}

/// Execute one command against `db` with the configured identity
///
/// Store operations report failures inline; a failed write is turned into an
/// error here so the process exits non-zero.
///
/// # Errors
/// Returns an error if the command fails
#[instrument(skip(db, config, writer))]
pub async fn run<W: Write>(
    command: Commands,
    db: HrOpsDatabase,
    config: &HrOpsConfig,
    writer: &mut W,
) -> anyhow::Result<()> {
    if command == Commands::Migrate {
        db.migrate().await?;
        info!("Database migrated");
        return print_json(&json!({"migrated": true}), writer);
    }
    if command == Commands::Health {
        return health_check(&db, writer).await;
    }

    let identity = SessionIdentity::new(config.identity.to_context());
    debug!(identity = ?identity.current(), "session identity");
    let context =
        StoreContext::new(Arc::new(db), identity).with_settings(config.accessor);

    match command {
        Commands::Tasks { action } => run_tasks(action, &TaskStore::new(&context), writer).await,
        Commands::Notices { action } => {
            run_notices(action, &NoticeStore::new(&context), writer).await
        }
        Commands::Attendance { action } => {
            run_attendance(action, &AttendanceStore::new(&context), writer).await
        }
        Commands::Departments { action } => {
            run_departments(action, &DepartmentStore::new(&context), writer).await
        }
        Commands::Migrate | Commands::Health => Ok(()),
    }
}

/// Print a write result, failing if the write failed
fn report<T: Serialize, W: Write>(
    result: &hrops_core::OperationResult<T>,
    writer: &mut W,
) -> anyhow::Result<()> {
    print_json(result, writer)?;
    match &result.error {
        Some(error) if !result.success => bail!("{error}"),
        _ => Ok(()),
    }
}

/// Fail a read that reported an error instead of printing an empty list
fn check_read(error: Option<String>) -> anyhow::Result<()> {
    match error {
        Some(error) => bail!("{error}"),
        None => Ok(()),
    }
}

async fn run_tasks<W: Write>(
    action: TaskCommand,
    store: &TaskStore,
    writer: &mut W,
) -> anyhow::Result<()> {
    match action {
        TaskCommand::List { limit } => {
            let tasks = match limit {
                Some(limit) => store.fetch_recent_tasks(limit.min(MAX_QUERY_LIMIT)).await,
                None => store.fetch_tasks().await,
            };
            check_read(store.accessor().error())?;
            print_json(&tasks, writer)
        }
        TaskCommand::Ongoing { assignee } => {
            let tasks = match assignee {
                Some(assignee) => store.fetch_ongoing_assigned_tasks(&assignee).await,
                None => store.fetch_ongoing_tasks().await,
            };
            check_read(store.accessor().error())?;
            print_json(&tasks, writer)
        }
        TaskCommand::Create(args) => {
            let request = CreateTaskRequest {
                task_title: args.title,
                task_description: args.description,
                assignees: args.assignees,
                priority: args.priority,
                ..Default::default()
            };
            report(&store.create_task(&request).await?, writer)
        }
        TaskCommand::Complete { id } => report(&store.complete_task(id).await?, writer),
        TaskCommand::Delete { id } => report(&store.delete_task(id).await?, writer),
    }
}

async fn run_notices<W: Write>(
    action: NoticeCommand,
    store: &NoticeStore,
    writer: &mut W,
) -> anyhow::Result<()> {
    match action {
        NoticeCommand::List { limit } => {
            let notices = match limit {
                Some(limit) => store.fetch_recent_notices(limit.min(MAX_QUERY_LIMIT)).await,
                None => store.fetch_notices().await,
            };
            check_read(store.accessor().error())?;
            print_json(&notices, writer)
        }
        NoticeCommand::Create {
            title,
            description,
            urgency,
            global,
        } => {
            let request = CreateNoticeRequest {
                title,
                description,
                urgency,
                department_id: global.then_some(None),
                ..Default::default()
            };
            report(&store.create_notice(&request).await?, writer)
        }
    }
}

async fn run_attendance<W: Write>(
    action: AttendanceCommand,
    store: &AttendanceStore,
    writer: &mut W,
) -> anyhow::Result<()> {
    match action {
        AttendanceCommand::Today => {
            let entry = store.fetch_today_attendance().await;
            check_read(store.accessor().error())?;
            print_json(&entry, writer)
        }
        AttendanceCommand::CheckIn { site } => report(&store.check_in(site).await?, writer),
        AttendanceCommand::CheckOut { id } => report(&store.check_out(id).await?, writer),
        AttendanceCommand::Range { from, to } => {
            let (Some(first), Some(last)) = (parse_date(&from), parse_date(&to)) else {
                bail!("Invalid date range: {from} to {to}");
            };
            let entries = store.fetch_attendance_range(first, last).await;
            check_read(store.accessor().error())?;
            print_json(&entries, writer)
        }
    }
}

async fn run_departments<W: Write>(
    action: DepartmentCommand,
    store: &DepartmentStore,
    writer: &mut W,
) -> anyhow::Result<()> {
    match action {
        DepartmentCommand::List => {
            let departments = store.fetch_all().await;
            check_read(store.accessor().error())?;
            print_json(&departments, writer)
        }
        DepartmentCommand::Create { name, description } => {
            let payload = json!({ "name": name, "description": description });
            report(&store.create(&payload).await?, writer)
        }
    }
}
