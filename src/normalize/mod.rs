//! Row normalization: raw cells to typed canonical records

mod cell;
mod claim;
mod validation;

pub use cell::{
    month_key, parse_count, parse_currency, parse_date, parse_month, parse_percentage,
    try_parse_currency, CellValue, RawRow,
};
pub use claim::{ExperienceRow, NormalizedClaim, RowNormalizer, UNSPECIFIED_SERVICE_TYPE};
pub use validation::{
    mapping_errors, validate_claims, validate_experience, CompletenessReport, Validated,
    ValidationIssue, ValidationOptions, ValidationResult, ValidationSummary,
};
