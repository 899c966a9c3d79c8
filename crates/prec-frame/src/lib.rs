#![deny(missing_docs)]
#![doc = "Columnar tables, string expressions and the data-source seams used to build background shapes."]

pub mod expr;
pub mod frame;
pub mod selection;
pub mod source;
/// In-memory column-oriented tables.
pub mod table;

pub use expr::CompiledExpr;
pub use frame::{CutRecord, CutReport, Frame};
pub use selection::{CutMap, SelectionProvider, StaticSelection};
pub use source::{DataSource, InMemorySource, JsonDirSource};
pub use table::{Column, RowView, Table};
