//! Condition import: resource retrieval, table decoding and row selection.

mod importer;
mod resource;
pub mod selection;
mod table;

pub use importer::{conditions_from_rows, ConditionImporter};
pub use resource::{DirectoryResources, MemoryResources, ResourceStore};
pub use selection::{parse_selection, Selection};
pub use table::{csv_cell, DefaultTableParser, Rows, TableFormat, TableParser};
