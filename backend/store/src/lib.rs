pub mod database;
pub mod schema;

pub use database::SqlDatabase;
pub use schema::{format_schema_for_prompt, ColumnInfo, SchemaInfo, SchemaRow};
