pub mod manager;
pub mod models;
pub mod query_builder;
pub mod sql;

pub use manager::{DatabaseError, DatabaseManager};
pub use sql::{sql_for_partial_update, sql_for_update, AttributeMap, PartialUpdate, SqlError, SqlFragment};
