//! Schema model
//!
//! Value objects describing a relational schema (columns, indexes, tables)
//! and the catalog that groups tables by schema name.

pub mod catalog;
pub mod column;
pub mod index;
pub mod table;

// Re-export commonly used types
pub use catalog::Catalog;
pub use column::Column;
pub use index::Index;
pub use table::{Table, TableName};
