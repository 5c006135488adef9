//! Canonical column tables for each known carrier export shape
//!
//! These are process-wide constants: expected column order, the required
//! subset, per-column kind and valid range, and carrier-specific aliases.

use serde::{Deserialize, Serialize};

/// Canonical field names shared by the mapper and the normalizer
pub mod fields {
    pub const CLAIM_ID: &str = "claim_id";
    pub const CLAIMANT_ID: &str = "claimant_id";
    pub const CLAIM_DATE: &str = "claim_date";
    pub const SERVICE_TYPE: &str = "service_type";
    pub const MEDICAL_AMOUNT: &str = "medical_amount";
    pub const PHARMACY_AMOUNT: &str = "pharmacy_amount";
    pub const TOTAL_AMOUNT: &str = "total_amount";
    pub const ICD_CODE: &str = "icd_code";
    pub const PROVIDER: &str = "provider";
    pub const LOCATION: &str = "location";
    pub const DIAGNOSIS_CATEGORY: &str = "diagnosis_category";
    pub const COINSURANCE_RATE: &str = "coinsurance_rate";

    pub const MONTH: &str = "month";
    pub const CATEGORY: &str = "category";
    pub const AMOUNT: &str = "amount";
    pub const EMPLOYEE_COUNT: &str = "employee_count";
    pub const MEMBER_COUNT: &str = "member_count";
    pub const CLAIMS: &str = "claims";
    pub const PREMIUM: &str = "premium";
}

/// Known input shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    /// Monthly experience rows broken out by cost category
    CostCategory,
    /// One row per claim, keyed by claimant
    PerClaimant,
    /// Headers did not resemble either known shape
    Unknown,
}

/// How a canonical column's raw cells are coerced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Currency,
    Percentage,
    Date,
    Count,
}

/// One canonical column in a schema table
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Carrier-specific header synonyms
    pub aliases: &'static [&'static str],
    /// Inclusive clamp applied after coercion (percentages are clamped as fractions)
    pub valid_range: Option<(f64, f64)>,
}

const fn column(
    name: &'static str,
    kind: FieldKind,
    required: bool,
    aliases: &'static [&'static str],
) -> ColumnSpec {
    ColumnSpec {
        name,
        kind,
        required,
        aliases,
        valid_range: None,
    }
}

pub const PER_CLAIMANT_COLUMNS: &[ColumnSpec] = &[
    column(fields::CLAIM_ID, FieldKind::Text, false, &[
        "Claim ID", "Claim Number", "Claim No", "Claim #", "Claim Nbr",
    ]),
    column(fields::CLAIMANT_ID, FieldKind::Text, true, &[
        "Claimant ID", "Claimant", "Member ID", "Member Number", "Subscriber ID",
        "Patient ID", "Employee ID",
    ]),
    column(fields::CLAIM_DATE, FieldKind::Date, true, &[
        "Claim Date", "Date of Service", "Service Date", "DOS", "Incurred Date",
        "Paid Date", "Date",
    ]),
    column(fields::SERVICE_TYPE, FieldKind::Text, false, &[
        "Service Type", "Type of Service", "Claim Type", "Service Category", "Benefit Type",
    ]),
    column(fields::MEDICAL_AMOUNT, FieldKind::Currency, false, &[
        "Medical", "Medical Paid", "Medical Claims", "Med Paid", "Medical Amount",
    ]),
    column(fields::PHARMACY_AMOUNT, FieldKind::Currency, false, &[
        "Rx", "Pharmacy", "Rx Paid", "Pharmacy Paid", "Drug Cost", "Rx Claims",
        "Pharmacy Amount",
    ]),
    column(fields::TOTAL_AMOUNT, FieldKind::Currency, false, &[
        "Total", "Total Paid", "Paid Amount", "Total Claims", "Total Amount", "Amount Paid",
    ]),
    column(fields::ICD_CODE, FieldKind::Text, false, &[
        "ICD", "ICD-10", "ICD Code", "Diagnosis Code", "Primary Diagnosis", "Dx Code",
    ]),
    column(fields::PROVIDER, FieldKind::Text, false, &[
        "Provider", "Provider Name", "Rendering Provider", "Facility", "Billing Provider",
    ]),
    column(fields::LOCATION, FieldKind::Text, false, &[
        "Location", "Division", "Site", "State", "Region",
    ]),
    column(fields::DIAGNOSIS_CATEGORY, FieldKind::Text, false, &[
        "Diagnosis Category", "Condition", "Clinical Category", "Dx Category",
        "Diagnosis Group",
    ]),
    ColumnSpec {
        name: fields::COINSURANCE_RATE,
        kind: FieldKind::Percentage,
        required: false,
        aliases: &["Coinsurance", "Coinsurance %", "Coins Pct"],
        valid_range: Some((0.0, 1.0)),
    },
];

pub const COST_CATEGORY_COLUMNS: &[ColumnSpec] = &[
    column(fields::MONTH, FieldKind::Date, true, &[
        "Month", "Period", "Service Month", "Incurred Month", "Paid Month", "Reporting Month",
    ]),
    column(fields::CATEGORY, FieldKind::Text, true, &[
        "Category", "Cost Category", "Line Item", "Description", "Expense Category",
    ]),
    column(fields::AMOUNT, FieldKind::Currency, true, &[
        "Amount", "Value", "Cost", "Dollars", "Monthly Amount",
    ]),
    ColumnSpec {
        name: fields::EMPLOYEE_COUNT,
        kind: FieldKind::Count,
        required: false,
        aliases: &["Employees", "Employee Count", "EE Count", "Enrolled Employees", "Subscribers"],
        valid_range: Some((0.0, f64::MAX)),
    },
    ColumnSpec {
        name: fields::MEMBER_COUNT,
        kind: FieldKind::Count,
        required: false,
        aliases: &["Members", "Member Count", "Covered Lives", "Enrollment"],
        valid_range: Some((0.0, f64::MAX)),
    },
    column(fields::CLAIMS, FieldKind::Currency, false, &[
        "Claims", "Claims Paid", "Paid Claims", "Incurred Claims",
    ]),
    column(fields::PREMIUM, FieldKind::Currency, false, &[
        "Premium", "Premiums", "Premium Equivalent", "Contributions", "Funding",
    ]),
];

impl SchemaType {
    /// Schemas that have column tables, in detection order
    pub const KNOWN: [SchemaType; 2] = [SchemaType::CostCategory, SchemaType::PerClaimant];

    /// Ordered canonical columns (empty for `Unknown`)
    pub fn columns(&self) -> &'static [ColumnSpec] {
        match self {
            SchemaType::CostCategory => COST_CATEGORY_COLUMNS,
            SchemaType::PerClaimant => PER_CLAIMANT_COLUMNS,
            SchemaType::Unknown => &[],
        }
    }

    pub fn column(&self, name: &str) -> Option<&'static ColumnSpec> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn expected_columns(&self) -> Vec<&'static str> {
        self.columns().iter().map(|c| c.name).collect()
    }

    pub fn required_columns(&self) -> Vec<&'static str> {
        self.columns()
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name)
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::CostCategory => "cost_category",
            SchemaType::PerClaimant => "per_claimant",
            SchemaType::Unknown => "unknown",
        }
    }
}
