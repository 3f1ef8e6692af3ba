//! Per-collection stores over [`crate::accessor::EntityAccessor`]
//!
//! Each store fixes the table, label and scoping flags of one collection and
//! names the generic operations after its domain.

pub mod approvals;
pub mod attendance;
pub mod notices;
pub mod organization;
pub mod stakeholders;
pub mod tasks;

pub use approvals::{LeaveStore, RequisitionStore, SettlementStore};
pub use attendance::AttendanceStore;
pub use notices::NoticeStore;
pub use organization::{DepartmentStore, DivisionStore, GradeStore, PositionStore, SiteStore};
pub use stakeholders::{StakeholderIssueStore, StakeholderStore};
pub use tasks::TaskStore;
