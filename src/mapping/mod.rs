//! Column mapping from carrier headers to canonical schema columns

mod mapper;

pub use mapper::{
    apply_mappings, apply_mappings_to_columns, count_exact_matches, derive_partition,
    generate_mappings, validate_mappings, ColumnMapping, MappingOptions, MappingResult,
    MappingValidation, DEFAULT_MATCH_THRESHOLD,
};
