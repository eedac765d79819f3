// 🗺️ Postal Code Reference Table
// (country, postal_code) → (longitude, latitude), loaded once and shared read-only

use crate::error::{GeoflowError, Result};
use csv::{ReaderBuilder, Trim};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Column count of a reference row: country, postal_code, latitude, longitude
const REFERENCE_COLUMNS: usize = 4;

// ============================================================================
// COORDINATES
// ============================================================================

/// One coordinate component. Keeps the literal it was read from so that
/// serialization carries exactly the reference table's precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Degrees {
    value: f64,
    literal: String,
}

impl Degrees {
    pub fn parse(text: &str) -> Option<Self> {
        let literal = text.trim();
        let value: f64 = literal.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(Degrees {
            value,
            literal: literal.to_string(),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.literal
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

/// A resolved (longitude, latitude) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub longitude: Degrees,
    pub latitude: Degrees,
}

/// One row of the reference file
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLookupEntry {
    pub country: String,
    pub postal_code: String,
    pub latitude: Degrees,
    pub longitude: Degrees,
}

// ============================================================================
// POSTAL INDEX
// ============================================================================

/// Deduplicated lookup table. Immutable once built.
#[derive(Debug, Default)]
pub struct PostalIndex {
    // country → postal_code → coordinate
    by_country: HashMap<String, HashMap<String, Coordinate>>,
    entries: usize,
    duplicates: usize,
}

impl PostalIndex {
    /// Build an index, keeping the first entry seen for each (country, postal_code)
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = GeoLookupEntry>,
    {
        let mut index = PostalIndex::default();

        for entry in entries {
            let codes = index.by_country.entry(entry.country).or_default();
            if codes.contains_key(&entry.postal_code) {
                index.duplicates += 1;
                continue;
            }
            codes.insert(
                entry.postal_code,
                Coordinate {
                    longitude: entry.longitude,
                    latitude: entry.latitude,
                },
            );
            index.entries += 1;
        }

        index
    }

    /// Load a headerless delimited reference file
    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)
            .map_err(|e| GeoflowError::reference(path, e.to_string()))?;

        let mut rows = Vec::new();

        for result in reader.records() {
            let record = result.map_err(|e| GeoflowError::reference(path, e.to_string()))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            if record.len() != REFERENCE_COLUMNS {
                return Err(GeoflowError::reference(
                    path,
                    format!(
                        "line {}: expected {} columns, found {}",
                        line,
                        REFERENCE_COLUMNS,
                        record.len()
                    ),
                ));
            }

            let country = &record[0];
            let postal_code = &record[1];
            if country.is_empty() || postal_code.is_empty() {
                return Err(GeoflowError::reference(
                    path,
                    format!("line {}: empty country or postal code", line),
                ));
            }

            let latitude = Degrees::parse(&record[2]).ok_or_else(|| {
                GeoflowError::reference(path, format!("line {}: invalid latitude {:?}", line, &record[2]))
            })?;
            let longitude = Degrees::parse(&record[3]).ok_or_else(|| {
                GeoflowError::reference(path, format!("line {}: invalid longitude {:?}", line, &record[3]))
            })?;

            rows.push(GeoLookupEntry {
                country: country.to_string(),
                postal_code: postal_code.to_string(),
                latitude,
                longitude,
            });
        }

        if rows.is_empty() {
            return Err(GeoflowError::reference(path, "file contains no entries"));
        }

        let index = PostalIndex::from_entries(rows);
        if index.duplicates > 0 {
            debug!(
                duplicates = index.duplicates,
                "Discarded duplicate reference keys (first occurrence kept)"
            );
        }
        info!(
            entries = index.entries,
            path = %path.display(),
            "Loaded postal code reference table"
        );

        Ok(index)
    }

    pub fn lookup(&self, country: &str, postal_code: &str) -> Option<&Coordinate> {
        self.by_country.get(country)?.get(postal_code)
    }

    /// Number of unique keys
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Number of source rows dropped as duplicate keys
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn country_count(&self) -> usize {
        self.by_country.len()
    }
}

// ============================================================================
// REFERENCE CACHE
// ============================================================================

/// Load-once holder for a reference table.
///
/// `get()` loads on first use and hands out the shared index afterwards.
/// `reload()` re-reads the file and swaps the index; conversions already
/// holding the previous `Arc` finish against it. A failed reload keeps the
/// previous index in place.
#[derive(Debug)]
pub struct ReferenceCache {
    path: PathBuf,
    delimiter: u8,
    index: RwLock<Option<Arc<PostalIndex>>>,
}

impl ReferenceCache {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        ReferenceCache {
            path: path.into(),
            delimiter,
            index: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Arc<PostalIndex>> {
        if let Some(index) = self.index.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            return Ok(Arc::clone(index));
        }

        let mut slot = self.index.write().unwrap_or_else(|e| e.into_inner());
        // another caller may have loaded it while we waited for the write lock
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(PostalIndex::load(&self.path, self.delimiter)?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    pub fn reload(&self) -> Result<Arc<PostalIndex>> {
        let index = Arc::new(PostalIndex::load(&self.path, self.delimiter)?);
        let mut slot = self.index.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    pub fn is_loaded(&self) -> bool {
        self.index.read().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
