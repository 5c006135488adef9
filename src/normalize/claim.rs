//! Canonical typed records built from mapped raw rows

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::cell::{
    month_key, parse_count, parse_currency, parse_date, parse_month, parse_percentage, CellValue,
    RawRow,
};
use crate::mapping::MappingResult;
use crate::schema::{fields, ColumnSpec, SchemaType};

/// Service type recorded when the carrier file has none
pub const UNSPECIFIED_SERVICE_TYPE: &str = "Unspecified";

/// One claim in canonical form
///
/// `claim_date` is always present: rows without a parseable date are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedClaim {
    pub id: String,
    pub claimant_id: String,
    pub claim_date: NaiveDate,
    /// `YYYY-MM`, derived from `claim_date`
    pub month_key: String,
    pub service_type: String,
    pub medical_amount: f64,
    pub pharmacy_amount: f64,
    /// Mapped total column when bound, else medical + pharmacy
    pub total_amount: f64,
    #[serde(default)]
    pub icd_code: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub diagnosis_category: Option<String>,
    /// Fraction in [0, 1]; `None` when the file has no coinsurance column
    #[serde(default)]
    pub coinsurance_rate: Option<f64>,
}

/// One month/category line from a cost-category export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRow {
    /// `YYYY-MM`
    pub month: String,
    pub category: String,
    pub amount: f64,
    pub employee_count: Option<f64>,
    pub member_count: Option<f64>,
    /// Explicit claims dollars, when the carrier supplies them separately
    pub claims: Option<f64>,
    /// Explicit premium (or premium-equivalent) dollars
    pub premium: Option<f64>,
}

/// Turns raw rows into canonical records using one resolved mapping
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    schema_type: SchemaType,
    /// Canonical column -> observed source header
    sources: HashMap<&'static str, String>,
}

impl RowNormalizer {
    pub fn new(mapping: &MappingResult) -> Self {
        let sources = mapping
            .mappings
            .iter()
            .filter_map(|m| {
                mapping
                    .schema_type
                    .column(&m.target)
                    .map(|spec| (spec.name, m.source.clone()))
            })
            .collect();

        Self {
            schema_type: mapping.schema_type,
            sources,
        }
    }

    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    /// Whether a canonical column was bound to some source header
    pub fn is_bound(&self, field: &str) -> bool {
        self.sources.contains_key(field)
    }

    /// Bound canonical columns with their source headers, in schema order
    pub fn bound_columns(&self) -> impl Iterator<Item = (&'static ColumnSpec, &str)> + '_ {
        self.schema_type
            .columns()
            .iter()
            .filter_map(|spec| self.sources.get(spec.name).map(|src| (spec, src.as_str())))
    }

    /// Cell for a canonical column; missing keys read as `Empty`
    pub fn cell<'r>(&self, row: &'r RawRow, field: &str) -> &'r CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.sources
            .get(field)
            .and_then(|src| row.get(src))
            .unwrap_or(EMPTY)
    }

    /// Date parse appropriate to the schema: full dates for claims, month forms for experience
    pub fn parse_date_cell(&self, cell: &CellValue) -> Option<NaiveDate> {
        match self.schema_type {
            SchemaType::CostCategory => parse_month(cell),
            _ => parse_date(cell),
        }
    }

    fn text(&self, row: &RawRow, field: &str) -> Option<String> {
        self.cell(row, field).as_text()
    }

    fn currency(&self, row: &RawRow, field: &str) -> f64 {
        parse_currency(self.cell(row, field))
    }

    /// Optional numeric column: `None` when unbound or blank
    fn optional_number(&self, row: &RawRow, field: &str) -> Option<f64> {
        let cell = self.cell(row, field);
        if !self.is_bound(field) || cell.is_empty() {
            return None;
        }
        let range = self.schema_type.column(field).and_then(|c| c.valid_range);
        Some(parse_count(cell, range))
    }

    /// Normalize a per-claimant row; `None` when the date is absent or unparseable
    pub fn normalize_claim(&self, row: &RawRow, row_number: usize) -> Option<NormalizedClaim> {
        let claim_date = self.parse_date_cell(self.cell(row, fields::CLAIM_DATE))?;

        let medical_amount = self.currency(row, fields::MEDICAL_AMOUNT);
        let pharmacy_amount = self.currency(row, fields::PHARMACY_AMOUNT);
        let total_amount = if self.is_bound(fields::TOTAL_AMOUNT) {
            self.currency(row, fields::TOTAL_AMOUNT)
        } else {
            medical_amount + pharmacy_amount
        };

        let coinsurance_rate = self.is_bound(fields::COINSURANCE_RATE).then(|| {
            let range = self
                .schema_type
                .column(fields::COINSURANCE_RATE)
                .and_then(|c| c.valid_range);
            parse_percentage(self.cell(row, fields::COINSURANCE_RATE), range)
        });

        Some(NormalizedClaim {
            id: self
                .text(row, fields::CLAIM_ID)
                .unwrap_or_else(|| format!("row-{}", row_number)),
            claimant_id: self.text(row, fields::CLAIMANT_ID).unwrap_or_default(),
            month_key: month_key(claim_date),
            claim_date,
            service_type: self
                .text(row, fields::SERVICE_TYPE)
                .unwrap_or_else(|| UNSPECIFIED_SERVICE_TYPE.to_string()),
            medical_amount,
            pharmacy_amount,
            total_amount,
            icd_code: self.text(row, fields::ICD_CODE),
            provider: self.text(row, fields::PROVIDER),
            location: self.text(row, fields::LOCATION),
            diagnosis_category: self.text(row, fields::DIAGNOSIS_CATEGORY),
            coinsurance_rate,
        })
    }

    /// Normalize a cost-category row; `None` when the month is absent or unparseable
    pub fn normalize_experience(&self, row: &RawRow) -> Option<ExperienceRow> {
        let month = self.parse_date_cell(self.cell(row, fields::MONTH))?;

        Some(ExperienceRow {
            month: month_key(month),
            category: self.text(row, fields::CATEGORY).unwrap_or_default(),
            amount: self.currency(row, fields::AMOUNT),
            employee_count: self.optional_number(row, fields::EMPLOYEE_COUNT),
            member_count: self.optional_number(row, fields::MEMBER_COUNT),
            claims: self.optional_number(row, fields::CLAIMS),
            premium: self.optional_number(row, fields::PREMIUM),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{generate_mappings, MappingOptions};

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from_raw(v)))
            .collect()
    }

    fn normalizer(headers: &[&str], schema: SchemaType) -> RowNormalizer {
        RowNormalizer::new(&generate_mappings(headers, schema, &MappingOptions::default()))
    }

    #[test]
    fn test_total_falls_back_to_medical_plus_rx() {
        let headers = ["Claim Date", "Claimant ID", "Medical", "Rx"];
        let n = normalizer(&headers, SchemaType::PerClaimant);
        let r = row(&[
            ("Claim Date", "01/15/2024"),
            ("Claimant ID", "C-100"),
            ("Medical", "$1,200.00"),
            ("Rx", "$300"),
        ]);

        let claim = n.normalize_claim(&r, 1).unwrap();
        assert_eq!(claim.total_amount, 1500.0);
        assert_eq!(claim.month_key, "2024-01");
        assert_eq!(claim.claimant_id, "C-100");
        assert_eq!(claim.id, "row-1");
        assert_eq!(claim.service_type, UNSPECIFIED_SERVICE_TYPE);
        assert_eq!(claim.coinsurance_rate, None);
    }

    #[test]
    fn test_bound_total_used_verbatim() {
        let headers = ["claim_date", "claimant_id", "medical_amount", "pharmacy_amount", "Total Paid"];
        let n = normalizer(&headers, SchemaType::PerClaimant);
        let r = row(&[
            ("claim_date", "2024-02-01"),
            ("claimant_id", "A"),
            ("medical_amount", "100"),
            ("pharmacy_amount", "50"),
            ("Total Paid", "175"),
        ]);
        assert_eq!(n.normalize_claim(&r, 1).unwrap().total_amount, 175.0);
    }

    #[test]
    fn test_unbound_total_column_still_falls_back() {
        // "Grand Sum" resembles nothing closely enough to bind as total_amount
        let headers = ["claim_date", "claimant_id", "medical_amount", "pharmacy_amount", "Grand Sum"];
        let n = normalizer(&headers, SchemaType::PerClaimant);
        assert!(!n.is_bound(fields::TOTAL_AMOUNT));
        let r = row(&[
            ("claim_date", "2024-02-01"),
            ("claimant_id", "A"),
            ("medical_amount", "100"),
            ("pharmacy_amount", "50"),
            ("Grand Sum", "999"),
        ]);
        assert_eq!(n.normalize_claim(&r, 1).unwrap().total_amount, 150.0);
    }

    #[test]
    fn test_bad_date_drops_row() {
        let headers = ["claim_date", "claimant_id", "medical_amount"];
        let n = normalizer(&headers, SchemaType::PerClaimant);
        let blank = row(&[("claim_date", ""), ("claimant_id", "A"), ("medical_amount", "10")]);
        let junk = row(&[("claim_date", "soon"), ("claimant_id", "A"), ("medical_amount", "10")]);
        assert!(n.normalize_claim(&blank, 1).is_none());
        assert!(n.normalize_claim(&junk, 2).is_none());
    }

    #[test]
    fn test_optional_fields_trimmed_or_none() {
        let headers = ["claim_date", "claimant_id", "Provider", "ICD Code", "Coinsurance %"];
        let n = normalizer(&headers, SchemaType::PerClaimant);
        let r = row(&[
            ("claim_date", "2024-03-05"),
            ("claimant_id", "A"),
            ("Provider", "  General Hospital "),
            ("ICD Code", "   "),
            ("Coinsurance %", "20%"),
        ]);
        let claim = n.normalize_claim(&r, 7).unwrap();
        assert_eq!(claim.provider.as_deref(), Some("General Hospital"));
        assert_eq!(claim.icd_code, None);
        assert_eq!(claim.coinsurance_rate, Some(0.2));
    }

    #[test]
    fn test_experience_row() {
        let headers = ["Month", "Category", "Amount", "Employees"];
        let n = normalizer(&headers, SchemaType::CostCategory);
        let r = row(&[
            ("Month", "Jan 2024"),
            ("Category", "Rx Claims"),
            ("Amount", "$12,500"),
            ("Employees", "120"),
        ]);
        let exp = n.normalize_experience(&r).unwrap();
        assert_eq!(exp.month, "2024-01");
        assert_eq!(exp.category, "Rx Claims");
        assert_eq!(exp.amount, 12500.0);
        assert_eq!(exp.employee_count, Some(120.0));
        assert_eq!(exp.premium, None);

        let bad = row(&[("Month", "TBD"), ("Category", "Rx Claims"), ("Amount", "1")]);
        assert!(n.normalize_experience(&bad).is_none());
    }
}
