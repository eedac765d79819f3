// 🏗️ Transaction Reader
// Delimited input → RawTransaction, with the header checked before any row is read

use crate::error::{GeoflowError, Result};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ============================================================================
// COLUMNS
// ============================================================================

pub const CAPTURE_TIMESTAMP: &str = "capture_timestamp";
pub const PAYER_ZIP: &str = "payer_zip";
pub const PAYER_COUNTRY: &str = "payer_country";
pub const PAYEE_ZIP: &str = "payee_zip";
pub const PAYEE_COUNTRY: &str = "payee_country";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    CAPTURE_TIMESTAMP,
    PAYER_ZIP,
    PAYER_COUNTRY,
    PAYEE_ZIP,
    PAYEE_COUNTRY,
];

/// Source columns of the passthrough fields (renamed to date, app_id, amount on output)
pub const CAPTURE_DAY: &str = "capture_day";
pub const PR_ID: &str = "pr_id";
pub const GROSS: &str = "gross";

pub const PASSTHROUGH_COLUMNS: [&str; 3] = [CAPTURE_DAY, PR_ID, GROSS];

// ============================================================================
// CORE TYPES
// ============================================================================

/// Optional columns carried into the output when passthrough is enabled
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Passthrough {
    pub capture_day: Option<String>,
    pub pr_id: Option<String>,
    pub gross: Option<String>,
}

/// RawTransaction - one input row, cells already trimmed, null markers as None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTransaction {
    pub capture_timestamp: Option<String>,
    pub payer_zip: Option<String>,
    pub payer_country: Option<String>,
    pub payee_zip: Option<String>,
    pub payee_country: Option<String>,
    pub passthrough: Option<Passthrough>,

    // Provenance
    pub line_number: u64,
}

/// Column positions resolved from the header row
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSchema {
    capture_timestamp: usize,
    payer_zip: usize,
    payer_country: usize,
    payee_zip: usize,
    payee_country: usize,
    passthrough: Option<[usize; 3]>,
}

impl TransactionSchema {
    /// Resolve column positions, failing with every missing column named
    pub fn from_headers(headers: &StringRecord, include_passthrough: bool, path: &Path) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let mut wanted: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        if include_passthrough {
            wanted.extend(PASSTHROUGH_COLUMNS);
        }

        let missing: Vec<String> = wanted
            .iter()
            .filter(|name| position(*name).is_none())
            .map(|name| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(GeoflowError::Schema {
                path: path.to_path_buf(),
                missing,
            });
        }

        // every column was just checked, the fallback is unreachable
        let at = |name: &str| position(name).unwrap_or(usize::MAX);

        Ok(TransactionSchema {
            capture_timestamp: at(CAPTURE_TIMESTAMP),
            payer_zip: at(PAYER_ZIP),
            payer_country: at(PAYER_COUNTRY),
            payee_zip: at(PAYEE_ZIP),
            payee_country: at(PAYEE_COUNTRY),
            passthrough: include_passthrough.then(|| [at(CAPTURE_DAY), at(PR_ID), at(GROSS)]),
        })
    }
}

// ============================================================================
// READER
// ============================================================================

#[derive(Debug, Clone)]
pub struct TransactionReader {
    pub delimiter: u8,
    pub include_passthrough: bool,
    /// Cell values treated as absent (compared after trimming)
    pub null_markers: Vec<String>,
}

impl TransactionReader {
    pub fn new(delimiter: u8, include_passthrough: bool, null_markers: Vec<String>) -> Self {
        TransactionReader {
            delimiter,
            include_passthrough,
            null_markers,
        }
    }

    /// Read every row of a transaction file
    pub fn read_path(&self, path: &Path) -> Result<Vec<RawTransaction>> {
        let file = File::open(path)?;
        self.read_from(file, path)
    }

    /// Read from any source; `path` is used for error reporting only
    pub fn read_from<R: Read>(&self, source: R, path: &Path) -> Result<Vec<RawTransaction>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        // header names are matched as text; a stray byte only spoils its own column name
        let headers: StringRecord = reader
            .byte_headers()
            .map_err(|e| GeoflowError::input(path, e.to_string()))?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();
        let schema = TransactionSchema::from_headers(&headers, self.include_passthrough, path)?;

        let mut transactions = Vec::new();

        // byte records: undecodable bytes in columns we never read must not abort the batch
        for result in reader.byte_records() {
            let record = result.map_err(|e| GeoflowError::input(path, e.to_string()))?;
            transactions.push(self.to_transaction(&record, &schema));
        }

        Ok(transactions)
    }

    fn to_transaction(&self, record: &ByteRecord, schema: &TransactionSchema) -> RawTransaction {
        // a cell that is not valid UTF-8 counts as absent
        let cell = |idx: usize| -> Option<String> {
            let value = std::str::from_utf8(record.get(idx)?).ok()?;
            if self.is_null(value) {
                None
            } else {
                Some(value.to_string())
            }
        };

        RawTransaction {
            capture_timestamp: cell(schema.capture_timestamp),
            payer_zip: cell(schema.payer_zip),
            payer_country: cell(schema.payer_country),
            payee_zip: cell(schema.payee_zip),
            payee_country: cell(schema.payee_country),
            passthrough: schema.passthrough.map(|[day, id, gross]| Passthrough {
                capture_day: cell(day),
                pr_id: cell(id),
                gross: cell(gross),
            }),
            line_number: record.position().map(|p| p.line()).unwrap_or(0),
        }
    }

    fn is_null(&self, value: &str) -> bool {
        value.is_empty() || self.null_markers.iter().any(|m| m == value)
    }
}

// ============================================================================
// TESTS
// ============================================================================
