//! Schema tables and header-set classification

mod tables;
mod detect;
pub mod categories;

pub use tables::{fields, ColumnSpec, FieldKind, SchemaType, COST_CATEGORY_COLUMNS, PER_CLAIMANT_COLUMNS};
pub use detect::detect_schema_type;
