//! Database module - SQLite backend behind the [`DataService`] seam

mod core;
pub mod mappers;
pub mod query_builders;
pub mod schema;
pub mod service;

pub use core::*;
pub use query_builders::{SelectBuilder, SqlStatement};
pub use service::{
    DataService, DeleteRequest, InsertRequest, SelectRequest, ServiceOperation, UpdateRequest,
};
