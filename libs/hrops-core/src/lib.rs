//! HR Ops Core - Scoped entity access for an HR operations backend
//!
//! This library loads and mutates the records of a multi-tenant HR
//! operations app (tasks, notices, attendance, stakeholders, approvals and
//! the company structure) without callers ever writing a tenant predicate.
//!
//! # Features
//!
//! - **Scoped Accessor**: [`EntityAccessor`] adds company, user and department
//!   predicates to reads and fills the scoping columns of writes
//! - **Typed Filters**: [`QueryFilters`] and [`QueryOptions`] describe reads
//!   without SQL
//! - **Async Database Access**: Built on SQLx behind the [`DataService`] seam
//! - **Domain Stores**: one store per collection in [`entities`]
//! - **Observability**: `tracing` spans on every operation, optional `metrics`
//!   counters
//!
//! # Quick Start
//!
//! ```no_run
//! use hrops_core::{
//!     CreateTaskRequest, HrOpsDatabase, HrOpsError, IdentityContext, SessionIdentity,
//!     StoreContext, TaskStore,
//! };
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), HrOpsError> {
//! let db = HrOpsDatabase::new(Path::new("/path/to/hrops.sqlite")).await?;
//! db.migrate().await?;
//!
//! let identity = SessionIdentity::new(IdentityContext::new(Some(42), None, None));
//! let tasks = TaskStore::new(&StoreContext::new(Arc::new(db), identity));
//!
//! let created = tasks
//!     .create_task(&CreateTaskRequest {
//!         task_title: "Review PR".to_string(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("created: {}", created.success);
//!
//! let ongoing = tasks.fetch_ongoing_tasks().await;
//! println!("Found {} ongoing tasks", ongoing.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Crate Features
//!
//! - `test-utils`: Enable test utilities (for testing only)
//! - `observability`: Count operations with the `metrics` crate

pub mod accessor;
pub mod config;
pub mod config_loader;
pub mod database;
pub mod entities;
pub mod error;
pub mod models;
pub mod observability;
pub mod query;
pub mod scope;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use accessor::{EntityAccessor, StoreContext};
pub use config::{AccessorSettings, DatabaseSettings, HrOpsConfig, IdentitySettings};
pub use config_loader::{load_config, load_config_from_file, ConfigLoader};
pub use database::{
    DataService, DatabasePoolConfig, DatabaseStats, HrOpsDatabase, PoolHealthStatus,
    SqliteOptimizations,
};
pub use entities::{
    AttendanceStore, DepartmentStore, DivisionStore, GradeStore, LeaveStore, NoticeStore,
    PositionStore, RequisitionStore, SettlementStore, SiteStore, StakeholderIssueStore,
    StakeholderStore, TaskStore,
};
pub use error::{HrOpsError, Result};
pub use models::*;
pub use observability::{init_tracing, ObservabilityConfig, ObservabilityError, Outcome};
pub use query::{
    Condition, NullCheck, QueryFilters, QueryFiltersBuilder, QueryOptions, ResultMode,
    SortDirection,
};
pub use scope::{EntityConfig, IdentityContext, ReadScope, ScopeResolver, SessionIdentity};
pub use state::{CollectionState, OperationResult};

/// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use uuid::Uuid;
