//! CSV and JSON export of processed claims, and re-import of both forms
//!
//! CSV rows go through the flat `ExportRow`, since the csv crate cannot
//! serialize the flattened `ProcessedClaim` shape directly. Fields containing
//! the delimiter, a quote or a newline are quoted with embedded quotes doubled.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::ProcessedClaim;
use crate::error::{EngineError, Result};
use crate::normalize::NormalizedClaim;

/// Exported CSV columns, in `ExportRow` field order
pub const EXPORT_COLUMNS: &[&str] = &[
    "id",
    "claimant_id",
    "claim_date",
    "month_key",
    "service_type",
    "medical_amount",
    "pharmacy_amount",
    "total_amount",
    "icd_code",
    "provider",
    "location",
    "diagnosis_category",
    "coinsurance_rate",
    "stop_loss_triggered",
    "stop_loss_excess",
    "stop_loss_reimbursement",
    "net_paid",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One exported CSV row
///
/// The date stays text so a bad value can be reported with its column name.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExportRow {
    id: String,
    claimant_id: String,
    claim_date: String,
    month_key: String,
    service_type: String,
    medical_amount: f64,
    pharmacy_amount: f64,
    total_amount: f64,
    icd_code: Option<String>,
    provider: Option<String>,
    location: Option<String>,
    diagnosis_category: Option<String>,
    coinsurance_rate: Option<f64>,
    stop_loss_triggered: bool,
    stop_loss_excess: f64,
    stop_loss_reimbursement: f64,
    net_paid: f64,
}

impl From<&ProcessedClaim> for ExportRow {
    fn from(p: &ProcessedClaim) -> Self {
        let c = &p.claim;
        Self {
            id: c.id.clone(),
            claimant_id: c.claimant_id.clone(),
            claim_date: c.claim_date.format(DATE_FORMAT).to_string(),
            month_key: c.month_key.clone(),
            service_type: c.service_type.clone(),
            medical_amount: c.medical_amount,
            pharmacy_amount: c.pharmacy_amount,
            total_amount: c.total_amount,
            icd_code: c.icd_code.clone(),
            provider: c.provider.clone(),
            location: c.location.clone(),
            diagnosis_category: c.diagnosis_category.clone(),
            coinsurance_rate: c.coinsurance_rate,
            stop_loss_triggered: p.stop_loss_triggered,
            stop_loss_excess: p.stop_loss_excess,
            stop_loss_reimbursement: p.stop_loss_reimbursement,
            net_paid: p.net_paid,
        }
    }
}

impl ExportRow {
    /// Rebuild the claim; `row` locates a bad date in the error
    fn into_claim(self, row: usize) -> Result<ProcessedClaim> {
        let claim_date = NaiveDate::parse_from_str(self.claim_date.trim(), DATE_FORMAT).map_err(|_| {
            EngineError::MalformedExport {
                row,
                field: "claim_date".to_string(),
                value: self.claim_date.clone(),
            }
        })?;

        Ok(ProcessedClaim {
            claim: NormalizedClaim {
                id: self.id,
                claimant_id: self.claimant_id,
                claim_date,
                month_key: self.month_key,
                service_type: self.service_type,
                medical_amount: self.medical_amount,
                pharmacy_amount: self.pharmacy_amount,
                total_amount: self.total_amount,
                icd_code: self.icd_code,
                provider: self.provider,
                location: self.location,
                diagnosis_category: self.diagnosis_category,
                coinsurance_rate: self.coinsurance_rate,
            },
            stop_loss_triggered: self.stop_loss_triggered,
            stop_loss_excess: self.stop_loss_excess,
            stop_loss_reimbursement: self.stop_loss_reimbursement,
            net_paid: self.net_paid,
        })
    }
}

/// Write claims as CSV with the given delimiter
///
/// The header is written even when there are no claims.
pub fn write_processed_csv<W: Write>(writer: W, claims: &[ProcessedClaim], delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(EXPORT_COLUMNS)?;
    for claim in claims {
        writer.serialize(ExportRow::from(claim))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_processed_json<W: Write>(writer: W, claims: &[ProcessedClaim]) -> Result<()> {
    serde_json::to_writer_pretty(writer, claims)?;
    Ok(())
}

/// Comma-delimited CSV export as a string
pub fn processed_to_csv(claims: &[ProcessedClaim]) -> Result<String> {
    let mut buf = Vec::new();
    write_processed_csv(&mut buf, claims, b',')?;
    String::from_utf8(buf).map_err(|e| EngineError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn processed_to_json(claims: &[ProcessedClaim]) -> Result<String> {
    Ok(serde_json::to_string_pretty(claims)?)
}

/// Write claims to `path` in the requested format
pub fn export_to_path<P: AsRef<Path>>(path: P, claims: &[ProcessedClaim], format: ExportFormat) -> Result<()> {
    let file = BufWriter::new(File::create(path.as_ref())?);
    match format {
        ExportFormat::Csv => write_processed_csv(file, claims, b',')?,
        ExportFormat::Json => write_processed_json(file, claims)?,
    }
    log::info!("wrote {} claims to {}", claims.len(), path.as_ref().display());
    Ok(())
}

/// Name the column behind a field-level parse failure, when the csv crate reports one
fn locate(err: csv::Error, row: usize, headers: &csv::StringRecord, record: &csv::StringRecord) -> EngineError {
    if let csv::ErrorKind::Deserialize { err: de, .. } = err.kind() {
        if let Some(i) = de.field() {
            let i = i as usize;
            return EngineError::MalformedExport {
                row,
                field: headers.get(i).unwrap_or_default().trim().to_string(),
                value: record.get(i).unwrap_or_default().to_string(),
            };
        }
    }
    EngineError::Csv(err)
}

/// Read claims back from a CSV export; columns are matched by header name
pub fn read_processed_csv<R: Read>(reader: R) -> Result<Vec<ProcessedClaim>> {
    let mut reader = csv::ReaderBuilder::new().from_reader(reader);
    let headers: csv::StringRecord = reader.headers()?.iter().map(str::trim).collect();

    let mut claims = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let export: ExportRow = record
            .deserialize(Some(&headers))
            .map_err(|e| locate(e, row, &headers, &record))?;
        claims.push(export.into_claim(row)?);
    }
    Ok(claims)
}

pub fn read_processed_json<R: Read>(reader: R) -> Result<Vec<ProcessedClaim>> {
    Ok(serde_json::from_reader(reader)?)
}
