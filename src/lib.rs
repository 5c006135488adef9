//! Experience Engine - carrier CSV normalization and claims/experience aggregation
//!
//! This library provides:
//! - Chunked CSV ingestion with encoding and delimiter detection
//! - Schema detection and fuzzy column mapping onto canonical schemas
//! - Row normalization with accumulated validation issues
//! - Specific stop-loss derivation and configurable budget line items
//! - Claims metrics, monthly financial roll-ups and loss-ratio summaries
//! - CSV/JSON export of processed claims

pub mod aggregation;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod mapping;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod similarity;

// Re-export commonly used types
pub use aggregation::{AggregatedMetrics, FinancialMetrics, MonthlySummary};
pub use config::{Configuration, ProcessedClaim};
pub use error::{EngineError, Result};
pub use mapping::{MappingOptions, MappingResult};
pub use normalize::{ExperienceRow, NormalizedClaim, ValidationOptions, ValidationResult};
pub use pipeline::{EngineReport, ExperienceEngine};
pub use schema::SchemaType;
