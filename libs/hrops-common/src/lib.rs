//! HR Ops Common - Shared constants and utilities
//!
//! # Examples
//!
//! ```
//! use hrops_common::{parse_date, COMPANY_COLUMN};
//!
//! assert_eq!(COMPANY_COLUMN, "company_id");
//! assert!(parse_date("2024-01-31").is_some());
//! ```

pub mod constants;
pub mod utils;

pub use constants::*;
pub use utils::*;
