use crate::{
    database::{
        mappers::{bind_all, map_record_row},
        query_builders::{delete_statement, quote_ident, InsertBuilder, SelectBuilder, UpdateBuilder},
        schema::{APPLICATION_TABLES, SCHEMA_STATEMENTS},
        service::{DataService, DeleteRequest, InsertRequest, SelectRequest, UpdateRequest},
    },
    error::{HrOpsError, Result as HrOpsResult},
    models::{Record, RecordId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Row, SqlitePool,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// In-memory database URL
pub const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// Database connection pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabasePoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Idle timeout for connections; `None` keeps them open
    pub idle_timeout: Option<Duration>,
    /// Maximum lifetime of a connection; `None` never recycles
    pub max_lifetime: Option<Duration>,
    /// Test connections before use
    pub test_before_acquire: bool,
    /// SQLite-specific settings applied to every connection
    pub sqlite_optimizations: SqliteOptimizations,
}

/// SQLite pragmas applied on connect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqliteOptimizations {
    /// Journal mode (WAL, DELETE, MEMORY, ...)
    pub journal_mode: String,
    /// Synchronous mode (NORMAL, FULL, OFF)
    pub synchronous_mode: String,
    /// Cache size in pages (negative = KB)
    pub cache_size: i32,
    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
    /// Temp store (MEMORY, FILE, DEFAULT)
    pub temp_store: String,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            test_before_acquire: true,
            sqlite_optimizations: SqliteOptimizations::default(),
        }
    }
}

impl DatabasePoolConfig {
    /// A private in-memory database lives only as long as its one connection
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            min_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
            ..Self::default()
        }
    }
}

impl Default for SqliteOptimizations {
    fn default() -> Self {
        Self {
            journal_mode: "WAL".to_string(),
            synchronous_mode: "NORMAL".to_string(),
            cache_size: -20000, // 20MB cache
            enable_foreign_keys: true,
            temp_store: "MEMORY".to_string(),
        }
    }
}

/// Connection pool health status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolHealthStatus {
    pub is_healthy: bool,
    pub pool_size: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    pub checked_at: DateTime<Utc>,
}

/// Row counts of the application tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub table_counts: BTreeMap<String, u64>,
}

impl DatabaseStats {
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.table_counts.values().sum()
    }
}

/// SQLx-backed store for the HR Ops tables
#[derive(Debug, Clone)]
pub struct HrOpsDatabase {
    pool: SqlitePool,
    config: DatabasePoolConfig,
}

impl HrOpsDatabase {
    /// Open (or create) the database file at `database_path`
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or if `SQLite` configuration fails
    #[instrument]
    pub async fn new(database_path: &Path) -> HrOpsResult<Self> {
        Self::new_with_config(database_path, DatabasePoolConfig::default()).await
    }

    /// Open (or create) the database file with custom pool settings
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or if `SQLite` configuration fails
    #[instrument]
    pub async fn new_with_config(
        database_path: &Path,
        config: DatabasePoolConfig,
    ) -> HrOpsResult<Self> {
        let database_url = format!("sqlite://{}", database_path.display());
        Self::from_connection_string_with_config(&database_url, config).await
    }

    /// Connect using a connection string with default configuration
    ///
    /// `sqlite::memory:` gets the single-connection in-memory configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or if `SQLite` configuration fails
    #[instrument]
    pub async fn from_connection_string(database_url: &str) -> HrOpsResult<Self> {
        let config = if is_memory_url(database_url) {
            DatabasePoolConfig::in_memory()
        } else {
            DatabasePoolConfig::default()
        };
        Self::from_connection_string_with_config(database_url, config).await
    }

    /// Connect using a connection string with custom configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or if `SQLite` configuration fails
    #[instrument]
    pub async fn from_connection_string_with_config(
        database_url: &str,
        config: DatabasePoolConfig,
    ) -> HrOpsResult<Self> {
        info!("Connecting to SQLite database: {}", database_url);

        let options = Self::connect_options(database_url, &config.sqlite_optimizations)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .test_before_acquire(config.test_before_acquire)
            .connect_with(options)
            .await
            .map_err(|e| HrOpsError::Database(format!("Failed to connect to database: {e}")))?;

        info!(
            "Database connection pool established with {} max connections",
            config.max_connections
        );

        Ok(Self { pool, config })
    }

    /// Fresh private in-memory database with the schema applied
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the migration fails
    pub async fn in_memory() -> HrOpsResult<Self> {
        let database =
            Self::from_connection_string_with_config(MEMORY_DATABASE_URL, DatabasePoolConfig::in_memory())
                .await?;
        database.migrate().await?;
        Ok(database)
    }

    /// Build per-connection options so every pooled connection gets the pragmas
    fn connect_options(
        database_url: &str,
        optimizations: &SqliteOptimizations,
    ) -> HrOpsResult<SqliteConnectOptions> {
        let journal_mode = SqliteJournalMode::from_str(&optimizations.journal_mode)
            .map_err(|e| HrOpsError::configuration(format!("Invalid journal mode: {e}")))?;
        let synchronous = SqliteSynchronous::from_str(&optimizations.synchronous_mode)
            .map_err(|e| HrOpsError::configuration(format!("Invalid synchronous mode: {e}")))?;

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| HrOpsError::configuration(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(journal_mode)
            .synchronous(synchronous)
            .foreign_keys(optimizations.enable_foreign_keys)
            .pragma("cache_size", optimizations.cache_size.to_string())
            .pragma("temp_store", optimizations.temp_store.clone());

        debug!(
            "SQLite options: journal={}, sync={}, cache={}KB, fk={}, temp={}",
            optimizations.journal_mode,
            optimizations.synchronous_mode,
            optimizations.cache_size.abs(),
            optimizations.enable_foreign_keys,
            optimizations.temp_store
        );

        Ok(options)
    }

    /// Create the application tables if they do not exist
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; nothing is applied in that case
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> HrOpsResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| HrOpsError::Database(format!("Failed to begin migration: {e}")))?;

        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| HrOpsError::Database(format!("Failed to apply schema: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| HrOpsError::Database(format!("Failed to commit migration: {e}")))?;

        info!("Applied {} schema statements", SCHEMA_STATEMENTS.len());
        Ok(())
    }

    /// Get the underlying connection pool
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if the database is connected
    #[instrument(skip(self))]
    pub async fn is_connected(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => {
                debug!("Database connection is healthy");
                true
            }
            Err(e) => {
                error!("Database connection check failed: {}", e);
                false
            }
        }
    }

    /// Get connection pool health status
    #[instrument(skip(self))]
    pub async fn get_pool_health(&self) -> PoolHealthStatus {
        let pool_size = self.pool.size();
        let idle_connections = u32::try_from(self.pool.num_idle()).unwrap_or(0);
        let is_healthy = self.is_connected().await;

        PoolHealthStatus {
            is_healthy,
            pool_size,
            active_connections: pool_size.saturating_sub(idle_connections),
            idle_connections,
            max_connections: self.config.max_connections,
            min_connections: self.config.min_connections,
            connection_timeout: self.config.connect_timeout,
            idle_timeout: self.config.idle_timeout,
            max_lifetime: self.config.max_lifetime,
            checked_at: Utc::now(),
        }
    }

    /// Count the rows of every application table
    ///
    /// # Errors
    ///
    /// Returns an error if a table is missing (run [`Self::migrate`] first)
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> HrOpsResult<DatabaseStats> {
        let mut stats = DatabaseStats::default();
        for table in APPLICATION_TABLES {
            let count: i64 =
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| HrOpsError::Database(format!("Failed to count {table}: {e}")))?;
            stats
                .table_counts
                .insert((*table).to_string(), u64::try_from(count).unwrap_or(0));
        }
        Ok(stats)
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url == MEMORY_DATABASE_URL || database_url.contains(":memory:")
}

#[async_trait]
impl DataService for HrOpsDatabase {
    #[instrument(skip(self, request), fields(table = %request.table.name))]
    async fn select(&self, request: SelectRequest) -> HrOpsResult<Vec<Record>> {
        let statement = SelectBuilder::new(&request.table.name)
            .scope(&request.scope)
            .filters(&request.filters)
            .options(&request.options)
            .build();
        debug!(sql = %statement.sql, binds = statement.binds.len(), "select");

        let rows = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                HrOpsError::Database(format!("Failed to select from {}: {e}", request.table.name))
            })?;

        rows.iter()
            .map(|row| map_record_row(row, &request.table))
            .collect()
    }

    #[instrument(skip(self, request), fields(table = %request.table.name))]
    async fn insert(&self, request: InsertRequest) -> HrOpsResult<Record> {
        let statement = InsertBuilder::new(&request.table.name)
            .values(&request.record)
            .returning(request.returning)
            .build();
        debug!(sql = %statement.sql, "insert");

        let row = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                HrOpsError::Database(format!("Failed to insert into {}: {e}", request.table.name))
            })?;

        map_record_row(&row, &request.table)
    }

    #[instrument(skip(self, request), fields(table = %request.table.name, id = request.id))]
    async fn update(&self, request: UpdateRequest) -> HrOpsResult<Option<Record>> {
        let builder = UpdateBuilder::from_record(&request.table.name, &request.changes);
        debug!(fields = ?builder.fields(), "update");
        let statement = builder.build(request.id, &request.guard);

        let row = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                HrOpsError::Database(format!("Failed to update {}: {e}", request.table.name))
            })?;

        row.map(|row| map_record_row(&row, &request.table))
            .transpose()
    }

    #[instrument(skip(self, request), fields(table = %request.table.name, id = request.id))]
    async fn delete(&self, request: DeleteRequest) -> HrOpsResult<Option<RecordId>> {
        let statement = delete_statement(&request.table.name, request.id, &request.guard);

        let row = bind_all(sqlx::query(&statement.sql), &statement.binds)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                HrOpsError::Database(format!("Failed to delete from {}: {e}", request.table.name))
            })?;

        row.map(|row| row.try_get::<i64, _>(0))
            .transpose()
            .map_err(HrOpsError::from)
    }
}
