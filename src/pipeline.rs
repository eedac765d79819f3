// 🔁 Conversion Pipeline
// read → normalize → join → project → sequence, each stage over the whole batch

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::geocode::join_batch;
use crate::normalize::normalize_batch;
use crate::parser::{RawTransaction, TransactionReader};
use crate::projection::{project_batch, OutputRecord};
use crate::reference::PostalIndex;
use crate::rules::RuleTable;
use crate::sequencer::{sequence, to_json, write_atomic};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// REPORT
// ============================================================================

/// What happened to the rows of one conversion. Not part of the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    pub input_rows: usize,
    pub retained: usize,
    pub dropped_incomplete: usize,
    pub dropped_invalid_timestamp: usize,
    pub dropped_unresolved_payer: usize,
    pub dropped_unresolved_payee: usize,
    /// SHA-256 of the serialized artifact, hex encoded
    pub sha256: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ConversionReport {
    pub fn summary(&self) -> String {
        format!("{}/{} transactions retained.", self.retained, self.input_rows)
    }

    pub fn dropped(&self) -> usize {
        self.input_rows - self.retained
    }
}

/// Serialized artifact plus its report
#[derive(Debug, Clone)]
pub struct Conversion {
    pub json: String,
    pub report: ConversionReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub input_rows: usize,
    pub incomplete: usize,
    pub invalid_timestamp: usize,
    pub unresolved_payer: usize,
    pub unresolved_payee: usize,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    reader: TransactionReader,
    rules: RuleTable,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Pipeline {
            reader: config.transaction_reader()?,
            rules: config.rule_table(),
        })
    }

    /// Transform an in-memory batch into ordered output records
    pub fn run_batch(&self, batch: Vec<RawTransaction>, index: &PostalIndex) -> (Vec<OutputRecord>, StageCounts) {
        let input_rows = batch.len();

        let normalized = normalize_batch(batch, &self.rules);
        let joined = join_batch(normalized.transactions, index);
        let mut records = project_batch(joined.transactions);
        sequence(&mut records);

        let counts = StageCounts {
            input_rows,
            incomplete: normalized.incomplete,
            invalid_timestamp: normalized.invalid_timestamp,
            unresolved_payer: joined.unresolved_payer,
            unresolved_payee: joined.unresolved_payee,
        };

        (records, counts)
    }

    /// Convert a transaction file and return the JSON text
    pub fn convert(&self, input_path: &Path, index: &PostalIndex) -> Result<Conversion> {
        let started_at = Utc::now();

        let batch = self.reader.read_path(input_path)?;
        let (records, counts) = self.run_batch(batch, index);
        let json = to_json(&records)?;

        let report = ConversionReport {
            input_path: input_path.to_path_buf(),
            output_path: None,
            input_rows: counts.input_rows,
            retained: records.len(),
            dropped_incomplete: counts.incomplete,
            dropped_invalid_timestamp: counts.invalid_timestamp,
            dropped_unresolved_payer: counts.unresolved_payer,
            dropped_unresolved_payee: counts.unresolved_payee,
            sha256: digest(json.as_bytes()),
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            input = %input_path.display(),
            incomplete = report.dropped_incomplete,
            invalid_timestamp = report.dropped_invalid_timestamp,
            unresolved_payer = report.dropped_unresolved_payer,
            unresolved_payee = report.dropped_unresolved_payee,
            "{}",
            report.summary()
        );

        Ok(Conversion { json, report })
    }

    /// Convert a transaction file and atomically write the artifact
    pub fn convert_to_file(&self, input_path: &Path, output_path: &Path, index: &PostalIndex) -> Result<ConversionReport> {
        let Conversion { json, mut report } = self.convert(input_path, index)?;

        write_atomic(output_path, json.as_bytes())?;
        info!(output = %output_path.display(), bytes = json.len(), "Wrote artifact");

        report.output_path = Some(output_path.to_path_buf());
        report.finished_at = Utc::now();
        Ok(report)
    }
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Convert with the default configuration and return the serialized JSON
pub fn convert(input_path: &Path, reference: &PostalIndex) -> Result<String> {
    let pipeline = Pipeline::new(&PipelineConfig::default())?;
    Ok(pipeline.convert(input_path, reference)?.json)
}

/// Convert with the default configuration and write the artifact to `output_path`
pub fn convert_to_file(input_path: &Path, output_path: &Path, reference: &PostalIndex) -> Result<ConversionReport> {
    let pipeline = Pipeline::new(&PipelineConfig::default())?;
    pipeline.convert_to_file(input_path, output_path, reference)
}

// ============================================================================
// TESTS
// ============================================================================
