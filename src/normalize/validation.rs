//! Row validation and completeness reporting
//!
//! Issues are accumulated over the whole file rather than raised, so a bad
//! row is reported and skipped while the remaining rows still normalize.
//! Row numbers are 1-based over the non-blank data records: the header and
//! blank lines are not counted. Row 0 is reserved for file-level mapping
//! errors.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::cell::{try_parse_currency, RawRow};
use super::claim::{ExperienceRow, NormalizedClaim, RowNormalizer};
use crate::mapping::MappingResult;
use crate::schema::{ColumnSpec, FieldKind};

/// One located problem in the input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 1-based data record, skipping blank lines; 0 for file-level issues
    pub row: usize,
    pub field: String,
    pub message: String,
    pub value: String,
}

/// Headline figures for the upload screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub member_count: usize,
    pub total_costs: f64,
    /// Percent of bound cells that were non-blank
    pub data_completeness: Option<f64>,
    /// Percent of valid claims naming a provider (claims files only)
    pub provider_coverage: Option<f64>,
}

/// Blank-value tallies, kept apart from the zero-filled numbers used in aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// Rows with a blank or invalid value in a required column
    pub missing_required: usize,
    /// Blank optional values per canonical column
    pub missing_optional: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub summary: ValidationSummary,
    pub completeness: CompletenessReport,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Normalize rows even when required columns could not be mapped
    pub allow_missing_required: bool,
}

/// Validation outcome plus the records that survived it
#[derive(Debug, Clone)]
pub struct Validated<T> {
    pub result: ValidationResult,
    pub records: Vec<T>,
}

/// File-level errors for required columns the mapper could not bind
pub fn mapping_errors(mapping: &MappingResult) -> Vec<ValidationIssue> {
    mapping
        .missing_required
        .iter()
        .map(|field| ValidationIssue {
            row: 0,
            field: field.clone(),
            message: format!("Required column '{}' could not be mapped", field),
            value: String::new(),
        })
        .collect()
}

/// Accumulator threaded through one validation pass
#[derive(Default)]
struct Tally {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    completeness: CompletenessReport,
    filled_cells: usize,
    checked_cells: usize,
    invalid_rows: usize,
}

impl Tally {
    fn issue(row: usize, spec: &ColumnSpec, message: &str, value: String) -> ValidationIssue {
        ValidationIssue {
            row,
            field: spec.name.to_string(),
            message: message.to_string(),
            value,
        }
    }

    /// Check every bound cell of one row; false when the row must be excluded
    fn check_row(&mut self, normalizer: &RowNormalizer, row: &RawRow, row_number: usize) -> bool {
        let mut row_ok = true;
        let mut missing_required = false;

        for (spec, _) in normalizer.bound_columns() {
            let cell = normalizer.cell(row, spec.name);
            self.checked_cells += 1;
            let blank = cell.is_empty();
            if !blank {
                self.filled_cells += 1;
            }

            if blank {
                if spec.required {
                    missing_required = true;
                    if spec.kind == FieldKind::Date {
                        row_ok = false;
                        self.errors.push(Self::issue(row_number, spec, "Missing date", String::new()));
                    } else {
                        self.warnings.push(Self::issue(
                            row_number,
                            spec,
                            "Required value is blank",
                            String::new(),
                        ));
                    }
                } else {
                    *self
                        .completeness
                        .missing_optional
                        .entry(spec.name.to_string())
                        .or_insert(0) += 1;
                }
                continue;
            }

            match spec.kind {
                FieldKind::Date => {
                    if normalizer.parse_date_cell(cell).is_none() {
                        row_ok = false;
                        missing_required |= spec.required;
                        self.errors.push(Self::issue(
                            row_number,
                            spec,
                            "Invalid date",
                            cell.to_string(),
                        ));
                    }
                }
                FieldKind::Currency | FieldKind::Percentage | FieldKind::Count => {
                    if try_parse_currency(cell).is_none() {
                        if spec.required {
                            row_ok = false;
                            missing_required = true;
                            self.errors.push(Self::issue(
                                row_number,
                                spec,
                                "Non-numeric value in required column",
                                cell.to_string(),
                            ));
                        } else {
                            self.warnings.push(Self::issue(
                                row_number,
                                spec,
                                "Non-numeric value treated as 0",
                                cell.to_string(),
                            ));
                        }
                    }
                }
                FieldKind::Text => {}
            }
        }

        if missing_required {
            self.completeness.missing_required += 1;
        }
        if !row_ok {
            self.invalid_rows += 1;
        }
        row_ok
    }

    fn finish(self, mapping_issues: Vec<ValidationIssue>, total_rows: usize, valid_rows: usize, summary: ValidationSummary) -> ValidationResult {
        let mut errors = mapping_issues;
        errors.extend(self.errors);

        ValidationResult {
            is_valid: errors.is_empty(),
            total_rows,
            valid_rows,
            invalid_rows: self.invalid_rows,
            errors,
            warnings: self.warnings,
            summary: ValidationSummary {
                data_completeness: percent(self.filled_cells, self.checked_cells),
                ..summary
            },
            completeness: self.completeness,
        }
    }
}

fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Result for a file blocked at the mapping stage: nothing is normalized
fn blocked(total_rows: usize, issues: Vec<ValidationIssue>) -> ValidationResult {
    ValidationResult {
        is_valid: false,
        total_rows,
        errors: issues,
        ..Default::default()
    }
}

/// Validate and normalize per-claimant rows
pub fn validate_claims(
    rows: &[RawRow],
    mapping: &MappingResult,
    options: &ValidationOptions,
) -> Validated<NormalizedClaim> {
    let mapping_issues = mapping_errors(mapping);
    if !mapping_issues.is_empty() && !options.allow_missing_required {
        log::warn!("claims file blocked: missing required columns {:?}", mapping.missing_required);
        return Validated {
            result: blocked(rows.len(), mapping_issues),
            records: Vec::new(),
        };
    }

    let normalizer = RowNormalizer::new(mapping);
    let mut tally = Tally::default();
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        let row_ok = tally.check_row(&normalizer, row, row_number);
        if !row_ok {
            continue;
        }
        match normalizer.normalize_claim(row, row_number) {
            Some(claim) => records.push(claim),
            None => {
                // Date column unbound (only reachable with allow_missing_required)
                tally.invalid_rows += 1;
                tally.errors.push(ValidationIssue {
                    row: row_number,
                    field: crate::schema::fields::CLAIM_DATE.to_string(),
                    message: "Missing date".to_string(),
                    value: String::new(),
                });
            }
        }
    }

    let members: HashSet<&str> = records
        .iter()
        .map(|c| c.claimant_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    let with_provider = records.iter().filter(|c| c.provider.is_some()).count();

    let summary = ValidationSummary {
        member_count: members.len(),
        total_costs: records.iter().map(|c| c.total_amount).sum(),
        data_completeness: None,
        provider_coverage: percent(with_provider, records.len()),
    };

    if tally.invalid_rows > 0 {
        log::warn!("{} of {} claim rows excluded", tally.invalid_rows, rows.len());
    }

    let valid_rows = records.len();
    Validated {
        result: tally.finish(mapping_issues, rows.len(), valid_rows, summary),
        records,
    }
}

/// Validate and normalize cost-category rows
pub fn validate_experience(
    rows: &[RawRow],
    mapping: &MappingResult,
    options: &ValidationOptions,
) -> Validated<ExperienceRow> {
    let mapping_issues = mapping_errors(mapping);
    if !mapping_issues.is_empty() && !options.allow_missing_required {
        log::warn!("experience file blocked: missing required columns {:?}", mapping.missing_required);
        return Validated {
            result: blocked(rows.len(), mapping_issues),
            records: Vec::new(),
        };
    }

    let normalizer = RowNormalizer::new(mapping);
    let mut tally = Tally::default();
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        let row_number = idx + 1;
        if !tally.check_row(&normalizer, row, row_number) {
            continue;
        }
        match normalizer.normalize_experience(row) {
            Some(exp) => records.push(exp),
            None => {
                tally.invalid_rows += 1;
                tally.errors.push(ValidationIssue {
                    row: row_number,
                    field: crate::schema::fields::MONTH.to_string(),
                    message: "Missing month".to_string(),
                    value: String::new(),
                });
            }
        }
    }

    let peak_members = records
        .iter()
        .filter_map(|r| r.member_count)
        .fold(0.0_f64, f64::max);

    let summary = ValidationSummary {
        member_count: peak_members.round() as usize,
        total_costs: records.iter().map(|r| r.amount).sum(),
        data_completeness: None,
        provider_coverage: None,
    };

    let valid_rows = records.len();
    Validated {
        result: tally.finish(mapping_issues, rows.len(), valid_rows, summary),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{generate_mappings, MappingOptions};
    use crate::normalize::CellValue;
    use crate::schema::{fields, SchemaType};

    fn rows(headers: &[&str], data: &[&[&str]]) -> Vec<RawRow> {
        data.iter()
            .map(|values| {
                headers
                    .iter()
                    .zip(values.iter())
                    .map(|(h, v)| (h.to_string(), CellValue::from_raw(v)))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_blank_date_excluded_processing_continues() {
        let headers = ["Claim Date", "Claimant ID", "Medical", "Provider"];
        let data = rows(
            &headers,
            &[
                &["01/15/2024", "A", "$100", "Clinic"],
                &["", "B", "$200", ""],
                &["02/01/2024", "C", "abc", ""],
            ],
        );
        let mapping = generate_mappings(&headers, SchemaType::PerClaimant, &MappingOptions::default());
        let validated = validate_claims(&data, &mapping, &ValidationOptions::default());
        let result = &validated.result;

        assert_eq!(result.total_rows, 3);
        assert_eq!(result.valid_rows, 2);
        assert_eq!(result.invalid_rows, 1);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 2);
        assert_eq!(result.errors[0].field, fields::CLAIM_DATE);

        // Non-numeric optional amount is a warning and reads as 0
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].value, "abc");
        assert_eq!(validated.records[1].medical_amount, 0.0);

        assert_eq!(result.completeness.missing_required, 1);
        assert_eq!(result.completeness.missing_optional.get(fields::PROVIDER), Some(&2));
        assert_eq!(result.summary.member_count, 2);
        assert_eq!(result.summary.total_costs, 100.0);
        assert_eq!(result.summary.provider_coverage, Some(50.0));
    }

    #[test]
    fn test_missing_required_column_blocks_rows() {
        let headers = ["Medical", "Rx"];
        let data = rows(&headers, &[&["1", "2"]]);
        let mapping = generate_mappings(&headers, SchemaType::PerClaimant, &MappingOptions::default());
        let validated = validate_claims(&data, &mapping, &ValidationOptions::default());

        assert!(validated.records.is_empty());
        assert_eq!(validated.result.errors.len(), 2);
        assert!(validated.result.errors.iter().all(|e| e.row == 0));
        assert_eq!(validated.result.valid_rows, 0);
    }

    #[test]
    fn test_override_still_needs_dates() {
        let headers = ["Claimant ID", "Medical"];
        let data = rows(&headers, &[&["A", "1"], &["B", "2"]]);
        let mapping = generate_mappings(&headers, SchemaType::PerClaimant, &MappingOptions::default());
        let options = ValidationOptions { allow_missing_required: true };
        let validated = validate_claims(&data, &mapping, &options);

        assert!(validated.records.is_empty());
        assert_eq!(validated.result.invalid_rows, 2);
        // one mapping error plus one per dropped row
        assert_eq!(validated.result.errors.len(), 3);
    }

    #[test]
    fn test_experience_non_numeric_required_amount_excluded() {
        let headers = ["Month", "Category", "Amount", "Members"];
        let data = rows(
            &headers,
            &[
                &["2024-01", "Rx Claims", "$500", "300"],
                &["2024-01", "Admin Fees", "pending", "300"],
                &["2024-02", "", "$10", ""],
            ],
        );
        let mapping = generate_mappings(&headers, SchemaType::CostCategory, &MappingOptions::default());
        let validated = validate_experience(&data, &mapping, &ValidationOptions::default());
        let result = &validated.result;

        assert_eq!(result.valid_rows, 2);
        assert_eq!(result.invalid_rows, 1);
        assert_eq!(result.errors[0].value, "pending");
        // blank category is kept but flagged
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.completeness.missing_required, 2);
        assert_eq!(result.summary.member_count, 300);
        assert_eq!(result.summary.total_costs, 510.0);
    }

    #[test]
    fn test_data_completeness_percent() {
        let headers = ["claim_date", "claimant_id"];
        let data = rows(&headers, &[&["2024-01-01", "A"], &["2024-01-02", ""]]);
        let mapping = generate_mappings(&headers, SchemaType::PerClaimant, &MappingOptions::default());
        let validated = validate_claims(&data, &mapping, &ValidationOptions::default());
        assert_eq!(validated.result.summary.data_completeness, Some(75.0));
        assert!(validated.result.is_valid);
    }
}
