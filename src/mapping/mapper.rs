//! Observed-header to canonical-column mapping
//!
//! Two passes over the observed headers, in order:
//! 1. exact (case-insensitive) match against an unclaimed canonical name
//! 2. fuzzy match against every unclaimed canonical name and its aliases
//!
//! A canonical column is claimed by the first header that binds it and is
//! then removed from the candidate pool, so exact matches always win over
//! fuzzy ones and no target is bound twice.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::normalize::RawRow;
use crate::schema::{ColumnSpec, SchemaType};
use crate::similarity::similarity;

/// Default fuzzy tolerance: a header must score at least `1 - 0.4 = 0.6`
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.4;

/// A single source header bound to a canonical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
    /// Match quality in [0, 1]; exactly 1.0 for perfect matches
    pub confidence: f64,
    pub is_required: bool,
    pub is_perfect_match: bool,
}

/// Tuning for `generate_mappings`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MappingOptions {
    /// Maximum dissimilarity accepted by the fuzzy pass
    pub threshold: f64,
    /// Whether alias tables participate in fuzzy scoring
    pub include_aliases: bool,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
            include_aliases: true,
        }
    }
}

/// Full outcome of mapping one header set against one schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingResult {
    pub schema_type: SchemaType,
    /// Bound mappings in observed-header order
    pub mappings: Vec<ColumnMapping>,
    /// Required canonical columns with no bound source, in schema order
    pub missing_required: Vec<String>,
    /// Observed headers left unbound, in observed order
    pub extra_columns: Vec<String>,
    /// Mean confidence of bound mappings (0 when nothing bound)
    pub confidence: f64,
}

impl MappingResult {
    /// Source header bound to a canonical column, if any
    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.mappings
            .iter()
            .find(|m| m.target == target)
            .map(|m| m.source.as_str())
    }

    pub fn is_bound(&self, target: &str) -> bool {
        self.source_for(target).is_some()
    }
}

/// Result of checking a mapping set against a schema's required columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingValidation {
    pub is_valid: bool,
    pub missing_required: Vec<String>,
}

/// Number of observed headers that equal (case-insensitively) a canonical column of `schema`
pub fn count_exact_matches<S: AsRef<str>>(observed: &[S], schema: SchemaType) -> usize {
    let expected: HashSet<String> = schema
        .expected_columns()
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect();

    observed
        .iter()
        .filter(|h| expected.contains(&h.as_ref().trim().to_lowercase()))
        .count()
}

/// Best fuzzy score of a header against a canonical column (name and, optionally, aliases)
fn target_score(source: &str, spec: &ColumnSpec, include_aliases: bool) -> f64 {
    let name_score = similarity(source, spec.name);
    if !include_aliases {
        return name_score;
    }
    spec.aliases
        .iter()
        .map(|alias| similarity(source, alias))
        .fold(name_score, f64::max)
}

fn bind(source: &str, spec: &ColumnSpec, confidence: f64, perfect: bool) -> ColumnMapping {
    ColumnMapping {
        source: source.to_string(),
        target: spec.name.to_string(),
        confidence,
        is_required: spec.required,
        is_perfect_match: perfect,
    }
}

/// Map observed headers onto `schema_type`'s canonical columns
pub fn generate_mappings<S: AsRef<str>>(
    observed: &[S],
    schema_type: SchemaType,
    options: &MappingOptions,
) -> MappingResult {
    let columns = schema_type.columns();
    let mut claimed = vec![false; columns.len()];
    let mut bound: Vec<Option<ColumnMapping>> = vec![None; observed.len()];

    // Pass 1: exact
    for (i, source) in observed.iter().enumerate() {
        let key = source.as_ref().trim().to_lowercase();
        let hit = columns
            .iter()
            .enumerate()
            .find(|(t, spec)| !claimed[*t] && spec.name.to_lowercase() == key);
        if let Some((t, spec)) = hit {
            claimed[t] = true;
            bound[i] = Some(bind(source.as_ref(), spec, 1.0, true));
        }
    }

    // Pass 2: fuzzy
    let min_score = 1.0 - options.threshold;
    for (i, source) in observed.iter().enumerate() {
        if bound[i].is_some() {
            continue;
        }

        let mut best: Option<(usize, f64)> = None;
        for (t, spec) in columns.iter().enumerate() {
            if claimed[t] {
                continue;
            }
            let score = target_score(source.as_ref(), spec, options.include_aliases);
            if score >= min_score && best.map_or(true, |(_, b)| score > b) {
                best = Some((t, score));
            }
        }

        if let Some((t, score)) = best {
            claimed[t] = true;
            let spec = &columns[t];
            log::debug!(
                "fuzzy match '{}' -> '{}' ({:.3})",
                source.as_ref(),
                spec.name,
                score
            );
            bound[i] = Some(bind(source.as_ref(), spec, score, false));
        }
    }

    let missing_required: Vec<String> = columns
        .iter()
        .zip(&claimed)
        .filter(|(spec, &c)| spec.required && !c)
        .map(|(spec, _)| spec.name.to_string())
        .collect();

    let extra_columns: Vec<String> = observed
        .iter()
        .zip(&bound)
        .filter(|(_, b)| b.is_none())
        .map(|(s, _)| s.as_ref().to_string())
        .collect();

    let mappings: Vec<ColumnMapping> = bound.into_iter().flatten().collect();

    let confidence = if mappings.is_empty() {
        0.0
    } else {
        mappings.iter().map(|m| m.confidence).sum::<f64>() / mappings.len() as f64
    };

    MappingResult {
        schema_type,
        mappings,
        missing_required,
        extra_columns,
        confidence,
    }
}

/// Rename each row's keys from source to target; unmapped keys pass through unchanged
pub fn apply_mappings(rows: &[RawRow], mappings: &[ColumnMapping]) -> Vec<RawRow> {
    let renames: HashMap<&str, &str> = mappings
        .iter()
        .map(|m| (m.source.as_str(), m.target.as_str()))
        .collect();

    rows.iter()
        .map(|row| {
            let mut out = RawRow::new();
            for (key, value) in row {
                if !renames.contains_key(key.as_str()) {
                    out.insert(key.clone(), value.clone());
                }
            }
            // Mapped keys overwrite any pass-through key of the same name
            for (key, value) in row {
                if let Some(target) = renames.get(key.as_str()) {
                    out.insert((*target).to_string(), value.clone());
                }
            }
            out
        })
        .collect()
}

/// Header-level counterpart of `apply_mappings`, preserving column order
pub fn apply_mappings_to_columns<S: AsRef<str>>(
    columns: &[S],
    mappings: &[ColumnMapping],
) -> Vec<String> {
    columns
        .iter()
        .map(|c| {
            mappings
                .iter()
                .find(|m| m.source == c.as_ref())
                .map(|m| m.target.clone())
                .unwrap_or_else(|| c.as_ref().to_string())
        })
        .collect()
}

/// Recover `(missing_required, extra_columns)` from already-renamed columns
pub fn derive_partition<S: AsRef<str>>(
    applied_columns: &[S],
    schema_type: SchemaType,
) -> (Vec<String>, Vec<String>) {
    let present: HashSet<&str> = applied_columns.iter().map(|c| c.as_ref()).collect();

    let missing = schema_type
        .required_columns()
        .into_iter()
        .filter(|name| !present.contains(name))
        .map(str::to_string)
        .collect();

    let extra = applied_columns
        .iter()
        .filter(|c| schema_type.column(c.as_ref()).is_none())
        .map(|c| c.as_ref().to_string())
        .collect();

    (missing, extra)
}

/// A mapping set is valid iff every required canonical column is bound
pub fn validate_mappings(mappings: &[ColumnMapping], schema_type: SchemaType) -> MappingValidation {
    let bound: HashSet<&str> = mappings.iter().map(|m| m.target.as_str()).collect();
    let missing_required: Vec<String> = schema_type
        .required_columns()
        .into_iter()
        .filter(|name| !bound.contains(name))
        .map(str::to_string)
        .collect();

    MappingValidation {
        is_valid: missing_required.is_empty(),
        missing_required,
    }
}
