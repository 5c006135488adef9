//! End-to-end run over one carrier file
//!
//! Holds the plan configuration and options once, then processes any
//! number of independent file snapshots. Each run is single-threaded and
//! shares no mutable state with other runs.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::aggregation::{
    aggregate_metrics, compute_financial_metrics, compute_monthly_summaries, AggregatedMetrics,
    FinancialMetrics, MonthlySummary,
};
use crate::config::{apply_configuration, evaluate_line_items, Configuration, LineItemResult, ProcessedClaim};
use crate::error::{EngineError, Result};
use crate::ingest::{load_file, load_from_reader, parse_csv_chunked, ParsedFile, TextEncoding, DEFAULT_CHUNK_SIZE};
use crate::mapping::{generate_mappings, MappingOptions, MappingResult};
use crate::normalize::{validate_claims, validate_experience, ExperienceRow, ValidationOptions, ValidationResult};
use crate::schema::{detect_schema_type, SchemaType};

/// How the input file was read
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub headers: Vec<String>,
    pub delimiter: char,
    pub encoding: TextEncoding,
    pub row_count: usize,
}

/// Output for a per-claimant file
#[derive(Debug, Clone, Serialize)]
pub struct ClaimsReport {
    pub source: SourceInfo,
    pub mapping: MappingResult,
    pub validation: ValidationResult,
    pub claims: Vec<ProcessedClaim>,
    pub metrics: AggregatedMetrics,
    pub line_items: Vec<LineItemResult>,
}

/// Output for a cost-category file
#[derive(Debug, Clone, Serialize)]
pub struct ExperienceReport {
    pub source: SourceInfo,
    pub mapping: MappingResult,
    pub validation: ValidationResult,
    pub rows: Vec<ExperienceRow>,
    pub financial: Vec<FinancialMetrics>,
    pub summaries: Vec<MonthlySummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineReport {
    Claims(ClaimsReport),
    Experience(ExperienceReport),
}

impl EngineReport {
    pub fn schema_type(&self) -> SchemaType {
        match self {
            EngineReport::Claims(_) => SchemaType::PerClaimant,
            EngineReport::Experience(_) => SchemaType::CostCategory,
        }
    }

    pub fn validation(&self) -> &ValidationResult {
        match self {
            EngineReport::Claims(r) => &r.validation,
            EngineReport::Experience(r) => &r.validation,
        }
    }

    pub fn as_claims(&self) -> Option<&ClaimsReport> {
        match self {
            EngineReport::Claims(r) => Some(r),
            EngineReport::Experience(_) => None,
        }
    }

    pub fn as_experience(&self) -> Option<&ExperienceReport> {
        match self {
            EngineReport::Experience(r) => Some(r),
            EngineReport::Claims(_) => None,
        }
    }
}

/// Configured engine for processing carrier files
#[derive(Debug, Clone)]
pub struct ExperienceEngine {
    config: Configuration,
    mapping_options: MappingOptions,
    validation_options: ValidationOptions,
    chunk_size: usize,
}

impl ExperienceEngine {
    /// Create an engine with a validated configuration and default options
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mapping_options: MappingOptions::default(),
            validation_options: ValidationOptions::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Create an engine from a JSON configuration file
    pub fn from_config_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(Configuration::from_json_path(path)?)
    }

    pub fn with_mapping_options(mut self, options: MappingOptions) -> Self {
        self.mapping_options = options;
        self
    }

    pub fn with_validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation_options = options;
        self
    }

    /// Byte window used for chunked ingestion
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Process an in-memory file
    pub fn process(&self, bytes: &[u8]) -> Result<EngineReport> {
        self.run(parse_csv_chunked(bytes, self.chunk_size)?)
    }

    pub fn process_reader<R: Read>(&self, reader: R) -> Result<EngineReport> {
        self.run(load_from_reader(reader, self.chunk_size)?)
    }

    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<EngineReport> {
        self.run(load_file(path, self.chunk_size)?)
    }

    fn run(&self, parsed: ParsedFile) -> Result<EngineReport> {
        let schema_type = detect_schema_type(&parsed.headers);
        if schema_type == SchemaType::Unknown {
            log::warn!("unrecognized columns: {:?}", parsed.headers);
            return Err(EngineError::UnknownSchema {
                columns: parsed.headers,
            });
        }

        let mapping = generate_mappings(&parsed.headers, schema_type, &self.mapping_options);
        log::debug!(
            "mapped {} of {} columns as {} (confidence {:.2})",
            mapping.mappings.len(),
            parsed.headers.len(),
            schema_type.as_str(),
            mapping.confidence
        );
        if !mapping.missing_required.is_empty() {
            log::warn!("missing required columns: {:?}", mapping.missing_required);
        }

        let source = SourceInfo {
            headers: parsed.headers.clone(),
            delimiter: parsed.delimiter as char,
            encoding: parsed.encoding,
            row_count: parsed.rows.len(),
        };

        let report = match schema_type {
            SchemaType::PerClaimant => EngineReport::Claims(self.run_claims(source, &parsed, mapping)),
            _ => EngineReport::Experience(self.run_experience(source, &parsed, mapping)),
        };

        let validation = report.validation();
        log::info!(
            "processed {} file: {} of {} rows valid, {} errors, {} warnings",
            schema_type.as_str(),
            validation.valid_rows,
            validation.total_rows,
            validation.errors.len(),
            validation.warnings.len()
        );
        Ok(report)
    }

    fn run_claims(&self, source: SourceInfo, parsed: &ParsedFile, mapping: MappingResult) -> ClaimsReport {
        let validated = validate_claims(&parsed.rows, &mapping, &self.validation_options);
        let claims = apply_configuration(&validated.records, &self.config);
        let metrics = aggregate_metrics(&claims);
        let months = self.config.active_months(&claims);
        let line_items = evaluate_line_items(&self.config.line_items, &claims, &months, self.config.member_count);

        ClaimsReport {
            source,
            mapping,
            validation: validated.result,
            claims,
            metrics,
            line_items,
        }
    }

    fn run_experience(&self, source: SourceInfo, parsed: &ParsedFile, mapping: MappingResult) -> ExperienceReport {
        let validated = validate_experience(&parsed.rows, &mapping, &self.validation_options);
        let financial = compute_financial_metrics(&validated.records, &self.config.budgets);
        let summaries = compute_monthly_summaries(&validated.records, &self.config.budgets.fees_by_month);

        ExperienceReport {
            source,
            mapping,
            validation: validated.result,
            rows: validated.records,
            financial,
            summaries,
        }
    }
}
