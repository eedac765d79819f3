// 🧹 Record Normalizer
// Completeness filter → country rules → string canonicalization → seconds to milliseconds

use crate::parser::{Passthrough, RawTransaction};
use crate::rules::RuleTable;
use tracing::debug;

// ============================================================================
// CORE TYPES
// ============================================================================

/// A (country, postal_code) pair in the reference table's canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalKey {
    pub country: String,
    pub postal_code: String,
}

/// A transaction with all four location fields present and canonical,
/// and its capture time in epoch milliseconds
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTransaction {
    pub time_ms: i64,
    pub payer: PostalKey,
    pub payee: PostalKey,
    pub passthrough: Option<Passthrough>,
    pub line_number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// One of payer_zip, payer_country, payee_zip, payee_country is absent
    Incomplete,
    /// capture_timestamp absent, non-integral, or out of range once scaled
    InvalidTimestamp,
}

#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub transactions: Vec<NormalizedTransaction>,
    pub incomplete: usize,
    pub invalid_timestamp: usize,
}

// ============================================================================
// NORMALIZATION
// ============================================================================

pub fn normalize(raw: RawTransaction, rules: &RuleTable) -> Result<NormalizedTransaction, Rejection> {
    let (payer_zip, payer_country, payee_zip, payee_country) = match (
        raw.payer_zip,
        raw.payer_country,
        raw.payee_zip,
        raw.payee_country,
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => return Err(Rejection::Incomplete),
    };

    let payer = canonical_key(payer_country, &payer_zip, rules);
    let payee = canonical_key(payee_country, &payee_zip, rules);

    let time_ms = raw
        .capture_timestamp
        .as_deref()
        .and_then(parse_epoch_seconds)
        .and_then(|secs| secs.checked_mul(1000))
        .ok_or(Rejection::InvalidTimestamp)?;

    Ok(NormalizedTransaction {
        time_ms,
        payer,
        payee,
        passthrough: raw.passthrough,
        line_number: raw.line_number,
    })
}

/// Normalize a whole batch, counting what was dropped and why
pub fn normalize_batch(batch: Vec<RawTransaction>, rules: &RuleTable) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome {
        transactions: Vec::with_capacity(batch.len()),
        ..NormalizeOutcome::default()
    };

    for raw in batch {
        match normalize(raw, rules) {
            Ok(tx) => outcome.transactions.push(tx),
            Err(Rejection::Incomplete) => outcome.incomplete += 1,
            Err(Rejection::InvalidTimestamp) => outcome.invalid_timestamp += 1,
        }
    }

    debug!(
        kept = outcome.transactions.len(),
        incomplete = outcome.incomplete,
        invalid_timestamp = outcome.invalid_timestamp,
        "Normalized transactions"
    );

    outcome
}

fn canonical_key(country: String, zip: &str, rules: &RuleTable) -> PostalKey {
    let postal_code = rules.apply(&country, natural_repr(zip));
    PostalKey { country, postal_code }
}

/// Undo float rendering of an integer code: "30076.0" → "30076".
/// Anything else is returned as is.
pub fn natural_repr(code: &str) -> &str {
    match integral_part(code) {
        Some(int) => int,
        None => code,
    }
}

fn integral_part(text: &str) -> Option<&str> {
    let (int, frac) = text.split_once('.')?;
    let digits = int.strip_prefix('-').unwrap_or(int);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if frac.is_empty() || !frac.bytes().all(|b| b == b'0') {
        return None;
    }
    Some(int)
}

/// Parse whole epoch seconds, accepting an integral float literal
pub fn parse_epoch_seconds(text: &str) -> Option<i64> {
    text.parse::<i64>()
        .ok()
        .or_else(|| integral_part(text)?.parse::<i64>().ok())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::default_rules;

    fn raw(ts: &str, payer: (&str, &str), payee: (&str, &str)) -> RawTransaction {
        RawTransaction {
            capture_timestamp: Some(ts.to_string()),
            payer_zip: Some(payer.0.to_string()),
            payer_country: Some(payer.1.to_string()),
            payee_zip: Some(payee.0.to_string()),
            payee_country: Some(payee.1.to_string()),
            passthrough: None,
            line_number: 2,
        }
    }

    #[test]
    fn test_timestamp_scaled_to_milliseconds() {
        let rules = RuleTable::from_rules(default_rules());
        let tx = normalize(raw("1412122952", ("30076", "US"), ("20815", "US")), &rules).unwrap();

        assert_eq!(tx.time_ms, 1412122952000);
    }

    #[test]
    fn test_each_missing_location_field_rejects() {
        let rules = RuleTable::from_rules(default_rules());
        let complete = raw("1", ("30076", "US"), ("20815", "US"));

        let mut no_payer_zip = complete.clone();
        no_payer_zip.payer_zip = None;
        let mut no_payer_country = complete.clone();
        no_payer_country.payer_country = None;
        let mut no_payee_zip = complete.clone();
        no_payee_zip.payee_zip = None;
        let mut no_payee_country = complete;
        no_payee_country.payee_country = None;

        for tx in [no_payer_zip, no_payer_country, no_payee_zip, no_payee_country] {
            assert_eq!(normalize(tx, &rules), Err(Rejection::Incomplete));
        }
    }

    #[test]
    fn test_incomplete_takes_precedence_over_bad_timestamp() {
        let rules = RuleTable::from_rules(default_rules());
        let mut tx = raw("not-a-time", ("30076", "US"), ("20815", "US"));
        tx.payee_country = None;

        assert_eq!(normalize(tx, &rules), Err(Rejection::Incomplete));
    }

    #[test]
    fn test_country_rules_per_side() {
        let rules = RuleTable::from_rules(default_rules());
        let tx = normalize(raw("1", ("K1A0B1", "CA"), ("1234", "US")), &rules).unwrap();

        assert_eq!(tx.payer.postal_code, "K1A");
        assert_eq!(tx.payer.country, "CA");
        assert_eq!(tx.payee.postal_code, "01234");
    }

    #[test]
    fn test_float_rendered_zip_restored() {
        let rules = RuleTable::from_rules(default_rules());
        let tx = normalize(raw("1412122952.0", ("1234.0", "US"), ("75001", "FR")), &rules).unwrap();

        assert_eq!(tx.payer.postal_code, "01234");
        assert_eq!(tx.payee.postal_code, "75001");
        assert_eq!(tx.time_ms, 1412122952000);
    }

    #[test]
    fn test_natural_repr() {
        assert_eq!(natural_repr("30076.0"), "30076");
        assert_eq!(natural_repr("30076.00"), "30076");
        assert_eq!(natural_repr("30076.5"), "30076.5");
        assert_eq!(natural_repr("K1A.0"), "K1A.0");
        assert_eq!(natural_repr("30076"), "30076");
        assert_eq!(natural_repr(".0"), ".0");
    }

    #[test]
    fn test_batch_counts_rejections() {
        let rules = RuleTable::from_rules(default_rules());
        let mut incomplete = raw("1", ("30076", "US"), ("20815", "US"));
        incomplete.payer_zip = None;
        let bad_time = raw("yesterday", ("30076", "US"), ("20815", "US"));
        let overflow = raw("9223372036854775807", ("30076", "US"), ("20815", "US"));
        let good = raw("2", ("30076", "US"), ("20815", "US"));

        let outcome = normalize_batch(vec![incomplete, bad_time, overflow, good], &rules);

        assert_eq!(outcome.transactions.len(), 1);
        assert_eq!(outcome.incomplete, 1);
        assert_eq!(outcome.invalid_timestamp, 2);
        assert_eq!(outcome.transactions[0].time_ms, 2000);
    }
}
